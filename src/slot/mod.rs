//! Slots: the per-child wrapper a box container lays out.
//!
//! A [`Slot`] carries the caption, spacer, alignment and expansion state of
//! one child. The capability traits split what the container and driver need
//! from a slot: [`Measurable`] for natural extents, [`Captionable`] for caption
//! offsets and [`Expandable`] for ratio distribution.

mod alignment;
mod caption;
mod core;

pub use alignment::{Alignment, HorizontalAlign, VerticalAlign, bits as alignment_bits};
pub use caption::{CAPTION_POSITION_ATTR, CaptionPosition, CaptionSpec};
pub use core::{NO_EXPAND, Slot};

use crate::error::Result;
use crate::geometry::Axis;
use crate::measure::MeasurementProvider;
use crate::surface::{ElementId, ElementTree};

pub trait Measurable {
    /// Outer extent of the child combined with its caption along `axis`.
    fn natural_extent<M>(&self, tree: &ElementTree, provider: &M, axis: Axis) -> Result<i32>
    where
        M: MeasurementProvider + ?Sized;

    /// Extent of the spacer in front of the slot, zero without one.
    fn spacing_extent<M>(&self, tree: &ElementTree, provider: &M, axis: Axis) -> Result<i32>
    where
        M: MeasurementProvider + ?Sized;
}

pub trait Captionable {
    fn caption_element(&self) -> Option<ElementId>;

    /// Current position, `None` without a caption.
    fn caption_position(&self) -> Option<CaptionPosition>;
}

pub trait Expandable {
    /// Share of the leftover primary space; negative means "do not expand".
    fn expand_ratio(&self) -> f64;

    fn is_relative_in(&self, axis: Axis) -> bool;

    fn is_expanding(&self) -> bool {
        self.expand_ratio() >= 0.0
    }
}
