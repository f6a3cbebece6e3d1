//! Measurement provider boundary.
//!
//! The engine never measures anything itself; it asks a
//! [`MeasurementProvider`] and falls back to an element's raw geometry when
//! the provider has nothing (for example on a detached tree).

mod cache;
mod core;

pub use cache::{MeasurementCache, ReportedSize};
pub use core::{MeasuredSize, MeasurementProvider, measure_or_raw, raw_measurement};
