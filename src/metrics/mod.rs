use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Counters accumulated across layout passes.
#[derive(Debug, Default, Clone)]
pub struct LayoutMetrics {
    passes: u64,
    axis_layouts: u64,
    expansions: u64,
    reports: u64,
    caption_offsets: u64,
    unchanged_passes: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&mut self, changed: bool) {
        self.passes = self.passes.saturating_add(1);
        if !changed {
            self.unchanged_passes = self.unchanged_passes.saturating_add(1);
        }
    }

    pub fn record_axis_layout(&mut self) {
        self.axis_layouts = self.axis_layouts.saturating_add(1);
    }

    pub fn record_expansion(&mut self) {
        self.expansions = self.expansions.saturating_add(1);
    }

    pub fn record_reports(&mut self, count: usize) {
        if count > 0 {
            self.reports = self.reports.saturating_add(count as u64);
        }
    }

    pub fn record_caption_offset(&mut self) {
        self.caption_offsets = self.caption_offsets.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            passes: self.passes,
            axis_layouts: self.axis_layouts,
            expansions: self.expansions,
            reports: self.reports,
            caption_offsets: self.caption_offsets,
            unchanged_passes: self.unchanged_passes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub passes: u64,
    pub axis_layouts: u64,
    pub expansions: u64,
    pub reports: u64,
    pub caption_offsets: u64,
    pub unchanged_passes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("passes".to_string(), json!(self.passes));
        map.insert("axis_layouts".to_string(), json!(self.axis_layouts));
        map.insert("expansions".to_string(), json!(self.expansions));
        map.insert("reports".to_string(), json!(self.reports));
        map.insert("caption_offsets".to_string(), json!(self.caption_offsets));
        map.insert("unchanged_passes".to_string(), json!(self.unchanged_passes));
        map
    }
}

pub fn snapshot_event(snapshot: &MetricSnapshot, target: &str) -> LogEvent {
    snapshot.to_log_event(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_counts_passes_and_reports() {
        let mut metrics = LayoutMetrics::new();
        metrics.record_pass(true);
        metrics.record_pass(false);
        metrics.record_reports(2);
        metrics.record_reports(0);

        let snapshot = metrics.snapshot(Duration::from_millis(15));
        assert_eq!(snapshot.passes, 2);
        assert_eq!(snapshot.unchanged_passes, 1);
        assert_eq!(snapshot.reports, 2);

        let event = snapshot_event(&snapshot, "slotbox::metrics");
        assert_eq!(event.message, "layout_metrics");
        assert_eq!(event.fields["uptime_ms"], json!(15));
    }
}
