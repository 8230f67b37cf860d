//! Document-space geometry shared by the layout table, the projector and the host.
//!
//! All coordinates are in content space: `x` grows right from the left edge of
//! the editable area, `y` grows down from the top of the document (not the
//! viewport). Scroll offsets are applied only when talking to the viewport.

/// A point in content space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair returned by element measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two x coordinates in either order
    pub fn spanning(x1: f32, x2: f32, y: f32, height: f32) -> Self {
        Self::new(x1.min(x2), y, (x1 - x2).abs(), height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive containment test (edges count as inside)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Area of the overlap between two rectangles, zero when disjoint
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let width = self.right().min(other.right()) - self.x.max(other.x);
        let height = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if width <= 0.0 || height <= 0.0 {
            0.0
        } else {
            width * height
        }
    }

    /// Clamp a point so that it lies strictly inside this rectangle
    ///
    /// Points on or beyond an edge are pulled one unit inside, which keeps
    /// hit-testing away from the ambiguous border between two lines.
    pub fn clamp_inside(&self, point: Point) -> Point {
        let x = if point.x < self.x {
            self.x + 1.0
        } else if point.x > self.right() {
            self.right() - 1.0
        } else {
            point.x
        };
        let y = if point.y < self.y {
            self.y + 1.0
        } else if point.y > self.bottom() {
            self.bottom() - 1.0
        } else {
            point.y
        };
        Point::new(x.max(self.x), y.max(self.y))
    }
}

/// Scroll request emitted when the caret leaves the visible container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollDelta {
    pub dx: f32,
    pub dy: f32,
}

impl ScrollDelta {
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}
