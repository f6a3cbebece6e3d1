//! Box container: ordered slots along one axis.
//!
//! `core` owns slot bookkeeping and placement; `expand` distributes leftover
//! primary space between expanding slots through a synthetic sizing frame.

mod core;
mod expand;
mod margins;

pub use core::BoxContainer;
pub use expand::{ExpandOutcome, distribute_ratios};
pub use margins::Margins;
