use serde::Serialize;

use crate::geometry::Axis;

/// Bit flags of the legacy alignment encoding.
pub mod bits {
    pub const LEFT: u32 = 1;
    pub const RIGHT: u32 = 2;
    pub const TOP: u32 = 4;
    pub const BOTTOM: u32 = 8;
    pub const CENTER: u32 = 16;
    pub const MIDDLE: u32 = 32;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Placement of a child inside its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Alignment {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl Alignment {
    pub const TOP_LEFT: Alignment = Alignment::new(HorizontalAlign::Left, VerticalAlign::Top);
    pub const MIDDLE_CENTER: Alignment =
        Alignment::new(HorizontalAlign::Center, VerticalAlign::Middle);
    pub const BOTTOM_RIGHT: Alignment =
        Alignment::new(HorizontalAlign::Right, VerticalAlign::Bottom);

    pub const fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Decode the legacy bitmask. Unset or contradictory bits fall back to
    /// left/top.
    pub fn from_bitmask(mask: u32) -> Self {
        let horizontal = if mask & bits::CENTER != 0 {
            HorizontalAlign::Center
        } else if mask & bits::RIGHT != 0 {
            HorizontalAlign::Right
        } else {
            HorizontalAlign::Left
        };
        let vertical = if mask & bits::MIDDLE != 0 {
            VerticalAlign::Middle
        } else if mask & bits::BOTTOM != 0 {
            VerticalAlign::Bottom
        } else {
            VerticalAlign::Top
        };
        Self::new(horizontal, vertical)
    }

    pub fn bitmask(&self) -> u32 {
        let horizontal = match self.horizontal {
            HorizontalAlign::Left => bits::LEFT,
            HorizontalAlign::Center => bits::CENTER,
            HorizontalAlign::Right => bits::RIGHT,
        };
        let vertical = match self.vertical {
            VerticalAlign::Top => bits::TOP,
            VerticalAlign::Middle => bits::MIDDLE,
            VerticalAlign::Bottom => bits::BOTTOM,
        };
        horizontal | vertical
    }

    /// True when the child is not pinned to the start of `axis`, which needs
    /// a concrete size along that axis to position against.
    pub fn is_off_start(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.horizontal != HorizontalAlign::Left,
            Axis::Vertical => self.vertical != VerticalAlign::Top,
        }
    }

    pub(crate) fn horizontal_class(&self) -> Option<&'static str> {
        match self.horizontal {
            HorizontalAlign::Left => None,
            HorizontalAlign::Center => Some("align-center"),
            HorizontalAlign::Right => Some("align-right"),
        }
    }

    pub(crate) fn vertical_class(&self) -> Option<&'static str> {
        match self.vertical {
            VerticalAlign::Top => None,
            VerticalAlign::Middle => Some("align-middle"),
            VerticalAlign::Bottom => Some("align-bottom"),
        }
    }
}
