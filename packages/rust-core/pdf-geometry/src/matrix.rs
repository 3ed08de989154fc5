//! Affine transformation matrix in PDF form
//!
//! PDF expresses transforms as six numbers `a b c d e f` standing for the
//! 3x3 matrix
//!
//! ```text
//! | a b 0 |
//! | c d 0 |
//! | e f 1 |
//! ```
//!
//! with row vectors multiplied on the left: `(x', y') = (x, y, 1) * M`.
//! The `cm` operator and the text/text-line matrices all use this form.

use crate::primitives::{Point, Rect};
use serde::{Deserialize, Serialize};

/// PDF affine transformation matrix (`a b c d e f`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    /// The identity transform
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Create a matrix from the six PDF operands in operator order
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation by (tx, ty)
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure scale by (sx, sy)
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Matrix product `self * other` (apply `self` first, then `other`)
    ///
    /// This is the composition order of the `cm` operator: the new CTM is
    /// `operand * CTM`, i.e. `operand.multiply(&ctm)`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a single point
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Transform a rectangle corner-wise, returning its normalized
    /// axis-aligned bounding box
    ///
    /// Under rotation or skew the image of a rectangle is not axis-aligned;
    /// the bounding box of the four transformed corners is the conservative
    /// answer used everywhere in the pipeline.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.transform_point(Point::new(rect.left, rect.bottom)),
            self.transform_point(Point::new(rect.right, rect.bottom)),
            self.transform_point(Point::new(rect.left, rect.top)),
            self.transform_point(Point::new(rect.right, rect.top)),
        ];
        let mut out = Rect::from_corners(corners[0].x, corners[0].y, corners[1].x, corners[1].y);
        for p in &corners[2..] {
            out = out.union(&Rect::from_corners(p.x, p.y, p.x, p.y));
        }
        out
    }

    /// Inverse transform, if the matrix is invertible
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}
