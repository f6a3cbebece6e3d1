//! Layout pass audit hooks.
//!
//! Every axis layout emits one record when it starts measuring, one when its
//! sizes are applied and one once its outer size was reported. Records carry
//! structured details so hosts can buffer, log or assert on the sequence.

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use serde_json::Value;

use crate::surface::ElementId;

/// Checkpoints of a container's layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAuditStage {
    /// Primary axis extents are being measured.
    PrimaryMeasuring,
    /// Primary axis sizes and expansion were applied.
    PrimaryApplied,
    SecondaryMeasuring,
    SecondaryApplied,
    /// An axis finished and its outer size, if any, was reported.
    PassCompleted,
    /// An axis layout failed; nothing was reported.
    PassAborted,
}

#[derive(Debug, Clone)]
pub struct LayoutAuditEvent {
    pub timestamp: SystemTime,
    pub stage: LayoutAuditStage,
    pub container: ElementId,
    pub details: Vec<(String, Value)>,
}

impl LayoutAuditEvent {
    fn new(stage: LayoutAuditStage, container: ElementId) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            container,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct LayoutAuditEventBuilder {
    event: LayoutAuditEvent,
}

impl LayoutAuditEventBuilder {
    pub fn new(stage: LayoutAuditStage, container: ElementId) -> Self {
        Self {
            event: LayoutAuditEvent::new(stage, container),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> LayoutAuditEvent {
        self.event
    }
}

pub trait LayoutAudit: Send + Sync {
    fn record(&self, event: LayoutAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullLayoutAudit;

impl LayoutAudit for NullLayoutAudit {
    fn record(&self, _event: LayoutAuditEvent) {}
}

/// Audit sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<LayoutAuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LayoutAuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<LayoutAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LayoutAudit for RecordingAudit {
    fn record(&self, event: LayoutAuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
