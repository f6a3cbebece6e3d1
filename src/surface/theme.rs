use serde::Serialize;

use crate::geometry::{Axis, Size};
use crate::width::display_width;

use super::tree::{Element, ElementKind};

/// Presentational metrics of the surface: what a stylesheet would decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    /// Extent of a spacing element along its container's stacking axis.
    pub spacing: i32,
    /// Padding applied for each enabled container margin.
    pub margin: i32,
    pub glyph_width: i32,
    pub line_height: i32,
    pub icon_size: i32,
    pub indicator_width: i32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            spacing: 8,
            margin: 12,
            glyph_width: 7,
            line_height: 18,
            icon_size: 16,
            indicator_width: 7,
        }
    }
}

impl Theme {
    /// Natural content size of a childless element. `parent_flow` is the
    /// stacking axis of the element's parent, if any.
    pub fn leaf_size(&self, element: &Element, parent_flow: Option<Axis>) -> Size {
        match element.kind {
            ElementKind::Spacer => {
                let mut size = Size::default();
                size.set_along(parent_flow.unwrap_or(Axis::Vertical), self.spacing);
                size
            }
            ElementKind::CaptionText => {
                let columns = element.text.as_deref().map(display_width).unwrap_or(0);
                Size::new(columns as i32 * self.glyph_width, self.line_height)
            }
            ElementKind::Icon => Size::new(self.icon_size, self.icon_size),
            ElementKind::RequiredIndicator | ElementKind::ErrorIndicator => {
                Size::new(self.indicator_width, self.line_height)
            }
            _ => element.intrinsic.unwrap_or_default(),
        }
    }
}
