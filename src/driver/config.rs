use std::sync::{Arc, Mutex};

use crate::logging::Logger;
use crate::metrics::LayoutMetrics;

use super::audit::{LayoutAudit, NullLayoutAudit};

/// Ambient services of a [`LayoutDriver`](super::LayoutDriver).
#[derive(Clone)]
pub struct DriverConfig {
    /// Optional structured logger used for pass events.
    pub logger: Option<Logger>,
    /// Counters shared with the host; `None` disables collection.
    pub metrics: Option<Arc<Mutex<LayoutMetrics>>>,
    pub audit: Arc<dyn LayoutAudit>,
    /// Target field used on every emitted log event.
    pub log_target: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: Arc::new(NullLayoutAudit),
            log_target: "slotbox::driver".to_string(),
        }
    }
}

impl DriverConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn LayoutAudit>) -> Self {
        self.audit = audit;
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(LayoutMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<LayoutMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}
