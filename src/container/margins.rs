use serde::Serialize;

use crate::geometry::Side;

/// Container margins, one flag per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Margins {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Margins {
    pub const NONE: Margins = Margins::new(false, false, false, false);
    pub const ALL: Margins = Margins::new(true, true, true, true);

    const TOP: u32 = 1;
    const RIGHT: u32 = 2;
    const BOTTOM: u32 = 4;
    const LEFT: u32 = 8;

    pub const fn new(top: bool, right: bool, bottom: bool, left: bool) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Decode the legacy bitmask (top=1, right=2, bottom=4, left=8).
    pub fn from_bitmask(mask: u32) -> Self {
        Self::new(
            mask & Self::TOP != 0,
            mask & Self::RIGHT != 0,
            mask & Self::BOTTOM != 0,
            mask & Self::LEFT != 0,
        )
    }

    pub fn bitmask(&self) -> u32 {
        let mut mask = 0;
        for (flag, bit) in [
            (self.top, Self::TOP),
            (self.right, Self::RIGHT),
            (self.bottom, Self::BOTTOM),
            (self.left, Self::LEFT),
        ] {
            if flag {
                mask |= bit;
            }
        }
        mask
    }

    pub fn is_enabled(&self, side: Side) -> bool {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }
}
