use serde::{Deserialize, Serialize};

/// A point in board-local coordinates (pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise `self + (to - from)`
    pub fn offset_by(self, from: Point, to: Point) -> Point {
        Point::new(self.x + (to.x - from.x), self.y + (to.y - from.y))
    }
}

/// Width and height of an item on the board
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    pub fn is_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }

    /// Raise each dimension to at least the given floor
    pub fn clamp_min(self, min_width: f64, min_height: f64) -> Size {
        Size::new(self.width.max(min_width), self.height.max(min_height))
    }
}

/// Axis-aligned rectangle, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Rect { origin, size }
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Inclusive on the top/left edge, exclusive on the bottom/right edge
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x && p.x < self.right() && p.y >= self.origin.y && p.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_by() {
        let p = Point::new(10.0, 20.0).offset_by(Point::new(5.0, 5.0), Point::new(8.0, 1.0));
        assert_eq!(p, Point::new(13.0, 16.0));
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(99.9, 49.9)));
        assert!(!r.contains(Point::new(100.0, 10.0)));
        assert!(!r.contains(Point::new(10.0, -0.1)));
        assert_eq!(r.center(), Point::new(50.0, 25.0));
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(!Point::new(f64::NAN, 0.0).is_finite());
        assert!(!Size::new(1.0, f64::INFINITY).is_finite());
        assert!(Size::new(1.0, 2.0).is_finite());
    }
}
