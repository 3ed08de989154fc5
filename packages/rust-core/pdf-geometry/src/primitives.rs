//! Primitive geometry types (Point, Rect)

use serde::{Deserialize, Serialize};

// ============================================================================
// Point
// ============================================================================

/// A point in PDF coordinate space (points, origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// An axis-aligned rectangle in PDF points, origin bottom-left
///
/// Invariant: `left <= right` and `bottom <= top`. Use [`Rect::from_corners`]
/// for coordinates in arbitrary order (rotated-text rectangles, transformed
/// corners); it normalizes the extents.
///
/// # Example
/// ```
/// use pdf_geometry::Rect;
///
/// let a = Rect::new(10.0, 10.0, 50.0, 30.0);
/// let b = Rect::from_corners(50.0, 30.0, 10.0, 10.0);
/// assert_eq!(a, b);
/// assert!(a.contains_point(20.0, 20.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Rect {
    /// Create a rectangle from already-ordered extents
    ///
    /// Callers must uphold `left <= right` and `bottom <= top`; use
    /// [`Rect::from_corners`] when the ordering is not known.
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Create a normalized rectangle from two opposite corners in any order
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Rectangle width (always non-negative)
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Rectangle height (always non-negative)
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Center point of the rectangle
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.bottom + self.top) / 2.0,
        )
    }

    /// Whether the point (x, y) lies inside the rectangle (edges inclusive)
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// Whether `other` lies entirely inside this rectangle (edges inclusive)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }

    /// Whether this rectangle and `other` share any area
    ///
    /// Degenerate (zero-width or zero-height) overlap does not count; a
    /// glyph touching a redaction area only at its edge is not "inside" it.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }

    /// The intersection of two rectangles, if non-degenerate
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        })
    }

    /// Grow the rectangle by `amount` points on every side
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect {
            left: self.left - amount,
            bottom: self.bottom - amount,
            right: self.right + amount,
            top: self.top + amount,
        }
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rect::from_corners(50.0, 30.0, 10.0, 10.0);
        assert_eq!(rect.left, 10.0);
        assert_eq!(rect.bottom, 10.0);
        assert_eq!(rect.right, 50.0);
        assert_eq!(rect.top, 30.0);
    }

    #[test]
    fn test_width_height() {
        let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn test_center() {
        let rect = Rect::new(0.0, 0.0, 10.0, 20.0);
        let c = rect.center();
        assert_eq!(c.x, 5.0);
        assert_eq!(c.y, 10.0);
    }

    #[test]
    fn test_contains_point_edges_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains_point(0.0, 0.0));
        assert!(rect.contains_point(10.0, 10.0));
        assert!(rect.contains_point(5.0, 5.0));
        assert!(!rect.contains_point(10.01, 5.0));
    }

    #[test]
    fn test_intersects_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_edge_touch_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersection_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Rect::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn test_intersection_disjoint_is_none() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(2.0, 2.0, 3.0, 3.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 90.0, 90.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
    }

    #[test]
    fn test_inflate() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        let grown = rect.inflate(2.0);
        assert_eq!(grown, Rect::new(8.0, 8.0, 22.0, 22.0));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 20.0, 8.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 20.0, 10.0));
    }

    #[test]
    fn test_serde_round_trip() {
        let rect = Rect::new(1.5, 2.5, 3.5, 4.5);
        let json = serde_json::to_string(&rect).unwrap();
        let back: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(rect, back);
    }
}
