//! Ordered-axis box layout engine.
//!
//! A [`BoxContainer`] stacks [`Slot`]s along its primary axis; each slot wraps
//! one child element together with its caption, spacer, alignment and expand
//! ratio. A [`LayoutDriver`] runs layout passes over containers, sizing them
//! either from content or from a declared size with leftover space shared by
//! expand ratio. Geometry comes from a [`MeasurementProvider`]; the crate
//! ships an element surface with a reference resolver and a
//! [`MeasurementCache`] so layouts can run without a host.
//!
//! The modules follow the `mod.rs` orchestrator pattern: public types are
//! re-exported here while implementation details stay in private `core`
//! modules.

pub mod container;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod measure;
pub mod metrics;
pub mod slot;
pub mod surface;
pub mod width;

pub use container::{BoxContainer, ExpandOutcome, Margins, distribute_ratios};
pub use driver::{
    DriverConfig, LayoutAudit, LayoutAuditEvent, LayoutAuditEventBuilder, LayoutAuditStage,
    LayoutDriver, NullLayoutAudit, PassPhase, PassReport, RecordingAudit, clear_caption_offset,
    update_caption_offset,
};
pub use error::{LayoutError, Result};
pub use geometry::{Axis, Edges, Rect, Side, Size};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use measure::{MeasuredSize, MeasurementCache, MeasurementProvider, ReportedSize};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use slot::{
    Alignment, CaptionPosition, CaptionSpec, Captionable, Expandable, HorizontalAlign,
    Measurable, NO_EXPAND, Slot, VerticalAlign,
};
pub use surface::{Dimension, ElementId, ElementKind, ElementTree, Theme, resolve};
pub use width::display_width;
