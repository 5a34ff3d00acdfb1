// Altrs Geometry
// Points and rectangles shared by the pointer, regions and window tracking

use std::fmt;

/// A position, either in pixels or normalised to the 0..1 range
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check whether a point lies inside (left/top edges inclusive)
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }

    /// Check whether a point lies inside the ellipse inscribed in this rectangle
    pub fn ellipse_contains_point(&self, point: &Point) -> bool {
        if self.is_empty() {
            return false;
        }
        let rx = self.width / 2.0;
        let ry = self.height / 2.0;
        let dx = (point.x - (self.left + rx)) / rx;
        let dy = (point.y - (self.top + ry)) / ry;
        dx * dx + dy * dy <= 1.0
    }

    /// Express a pixel point relative to this rectangle, in the 0..1 range
    pub fn normalise(&self, point: &Point) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        Some(Point::new(
            (point.x - self.left) / self.width,
            (point.y - self.top) / self.height,
        ))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_point() {
        let rect = Rect::new(0.25, 0.25, 0.5, 0.5);
        assert!(rect.contains_point(&Point::new(0.5, 0.5)));
        assert!(rect.contains_point(&Point::new(0.25, 0.25)));
        assert!(!rect.contains_point(&Point::new(0.75, 0.5)));
        assert!(!rect.contains_point(&Point::new(0.1, 0.5)));
    }

    #[test]
    fn test_ellipse_excludes_corners() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(rect.ellipse_contains_point(&Point::new(0.5, 0.5)));
        assert!(!rect.ellipse_contains_point(&Point::new(0.02, 0.02)));
    }

    #[test]
    fn test_normalise() {
        let screen = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        let p = screen.normalise(&Point::new(960.0, 270.0)).unwrap();
        assert_eq!(p, Point::new(0.5, 0.25));
        assert!(Rect::default().normalise(&p).is_none());
    }
}
