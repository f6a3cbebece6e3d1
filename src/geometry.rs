use serde::Serialize;

/// Layout axis. The primary axis of a container is its stacking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn cross(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Side where flow starts along this axis.
    pub fn start_side(self) -> Side {
        match self {
            Axis::Horizontal => Side::Left,
            Axis::Vertical => Side::Top,
        }
    }

    pub fn end_side(self) -> Side {
        match self {
            Axis::Horizontal => Side::Right,
            Axis::Vertical => Side::Bottom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];
}

/// Integer size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    pub fn set_along(&mut self, axis: Axis, value: i32) {
        match axis {
            Axis::Horizontal => self.width = value,
            Axis::Vertical => self.height = value,
        }
    }
}

/// Border-box rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn origin_along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Pixel widths for the four sides of a box (border, padding or margin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Edges {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Edges {
    pub const ZERO: Edges = Edges::uniform(0);

    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn side(&self, side: Side) -> i32 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    pub fn set_side(&mut self, side: Side, value: i32) {
        match side {
            Side::Top => self.top = value,
            Side::Right => self.right = value,
            Side::Bottom => self.bottom = value,
            Side::Left => self.left = value,
        }
    }

    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }

    /// Sum of both sides lying on `axis`.
    pub fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.horizontal(),
            Axis::Vertical => self.vertical(),
        }
    }

    pub fn start(&self, axis: Axis) -> i32 {
        self.side(axis.start_side())
    }

    pub fn end(&self, axis: Axis) -> i32 {
        self.side(axis.end_side())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_sum_per_axis() {
        let edges = Edges::new(1, 2, 3, 4);
        assert_eq!(edges.along(Axis::Horizontal), 6);
        assert_eq!(edges.along(Axis::Vertical), 4);
        assert_eq!(edges.start(Axis::Horizontal), 4);
        assert_eq!(edges.end(Axis::Vertical), 3);
    }

    #[test]
    fn size_axis_accessors() {
        let mut size = Size::new(10, 20);
        assert_eq!(size.along(Axis::Vertical), 20);
        size.set_along(Axis::Horizontal, 5);
        assert_eq!(size, Size::new(5, 20));
        assert_eq!(Axis::Horizontal.cross(), Axis::Vertical);
    }
}
