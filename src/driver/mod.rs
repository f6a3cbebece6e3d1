//! Layout driver: per-pass orchestration of box containers.
//!
//! `core` runs the primary and secondary axis layouts and owns the pass
//! state machine, `caption` applies caption offsets, `audit` and `config`
//! carry the ambient hooks a host plugs in.

pub mod audit;
mod caption;
mod config;
mod core;

pub use audit::{
    LayoutAudit, LayoutAuditEvent, LayoutAuditEventBuilder, LayoutAuditStage, NullLayoutAudit,
    RecordingAudit,
};
pub use caption::{clear_caption_offset, update_caption_offset};
pub use config::DriverConfig;
pub use core::{LayoutDriver, PassPhase, PassReport, fingerprint};
