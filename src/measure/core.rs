use serde::Serialize;

use crate::error::Result;
use crate::geometry::{Axis, Edges, Size};
use crate::surface::{ElementId, ElementTree, natural_size};

/// Measured geometry of one element. `size` is the border box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeasuredSize {
    pub size: Size,
    pub border: Edges,
    pub padding: Edges,
    pub margin: Edges,
}

impl MeasuredSize {
    /// Border box plus margins.
    pub fn outer(&self, axis: Axis) -> i32 {
        self.size.along(axis) + self.margin.along(axis)
    }

    /// Border box without margins, the part of an element that paints.
    pub fn border_box(&self, axis: Axis) -> i32 {
        self.size.along(axis)
    }

    /// Content box: border box minus border and padding.
    pub fn inner(&self, axis: Axis) -> i32 {
        (self.size.along(axis) - self.border.along(axis) - self.padding.along(axis)).max(0)
    }
}

/// Service reporting element sizes and accepting upward size reports.
pub trait MeasurementProvider {
    /// Current measurement, or `None` when the element was never measured.
    fn measure(&self, element: ElementId) -> Option<MeasuredSize>;

    /// Report the outer width a container computed for itself.
    fn report_outer_width(&mut self, element: ElementId, outer_width: i32);

    fn report_outer_height(&mut self, element: ElementId, outer_height: i32);

    /// Ask for `element` to be measured again before the next pass.
    fn set_needs_measure(&mut self, element: ElementId);

    /// Request a deferred layout pass.
    fn schedule_layout(&mut self);

    fn report_outer(&mut self, element: ElementId, axis: Axis, outer: i32) {
        match axis {
            Axis::Horizontal => self.report_outer_width(element, outer),
            Axis::Vertical => self.report_outer_height(element, outer),
        }
    }

    fn outer_width(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.outer(Axis::Horizontal))
    }

    fn outer_height(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.outer(Axis::Vertical))
    }

    fn inner_width(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.inner(Axis::Horizontal))
    }

    fn inner_height(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.inner(Axis::Vertical))
    }

    fn border_width(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.border.horizontal())
    }

    fn border_height(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.border.vertical())
    }

    fn padding_top(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.padding.top)
    }

    fn padding_right(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.padding.right)
    }

    fn padding_bottom(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.padding.bottom)
    }

    fn padding_left(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.padding.left)
    }

    fn margin_width(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.margin.horizontal())
    }

    fn margin_height(&self, element: ElementId) -> Option<i32> {
        self.measure(element).map(|m| m.margin.vertical())
    }
}

/// Geometry an element has on its own: content-driven border box plus its
/// styled border, padding and margin.
pub fn raw_measurement(tree: &ElementTree, element: ElementId) -> Result<MeasuredSize> {
    Ok(MeasuredSize {
        size: natural_size(tree, element)?,
        border: tree.get(element)?.border,
        padding: tree.computed_padding(element)?,
        margin: tree.computed_margin(element)?,
    })
}

/// Provider measurement, or the raw fallback when the provider has none.
pub fn measure_or_raw<M>(
    provider: &M,
    tree: &ElementTree,
    element: ElementId,
) -> Result<MeasuredSize>
where
    M: MeasurementProvider + ?Sized,
{
    match provider.measure(element) {
        Some(measured) => Ok(measured),
        None => raw_measurement(tree, element),
    }
}
