//! Page rotation and visual↔content-space mapping
//!
//! A page's content stream draws in *content-stream space*; the page's
//! `/Rotate` entry then turns the result for display. The letter extractor
//! reports rectangles in *visual space* (what the viewer shows), so redaction
//! areas have to be mapped into content-stream space before they can be
//! compared against glyph boxes, and back again when drawing markers.

use crate::error::GeometryError;
use crate::primitives::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Page rotation, normalized to one of the four legal values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageRotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl PageRotation {
    /// Normalize a raw `/Rotate` value (any multiple of 90, possibly
    /// negative) to a rotation
    ///
    /// # Errors
    /// Returns `GeometryError::InvalidRotation` for values not divisible
    /// by 90.
    pub fn from_degrees(degrees: i64) -> Result<Self, GeometryError> {
        if degrees % 90 != 0 {
            return Err(GeometryError::InvalidRotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => PageRotation::None,
            90 => PageRotation::Quarter,
            180 => PageRotation::Half,
            _ => PageRotation::ThreeQuarter,
        })
    }

    /// The rotation in degrees (0, 90, 180, or 270)
    pub fn degrees(&self) -> i64 {
        match self {
            PageRotation::None => 0,
            PageRotation::Quarter => 90,
            PageRotation::Half => 180,
            PageRotation::ThreeQuarter => 270,
        }
    }

    /// Whether the rotation swaps the page's width and height
    pub fn swaps_axes(&self) -> bool {
        matches!(self, PageRotation::Quarter | PageRotation::ThreeQuarter)
    }
}

/// Immutable per-page geometry: media box dimensions plus rotation
///
/// # Example
/// ```
/// use pdf_geometry::{PageGeometry, Rect};
///
/// // US Letter rotated a quarter turn
/// let page = PageGeometry::new(612.0, 792.0, 90).unwrap();
/// assert_eq!(page.visual_dimensions(), (792.0, 612.0));
///
/// let visual = Rect::new(284.0, 300.0, 520.0, 320.0);
/// let content = page.visual_to_content(&visual);
/// assert_eq!(content, Rect::new(472.0, 284.0, 492.0, 520.0));
/// assert_eq!(page.content_to_visual(&content), visual);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    media_width: f64,
    media_height: f64,
    rotation: PageRotation,
}

impl PageGeometry {
    /// Create page geometry from media box dimensions and a raw `/Rotate`
    /// value
    ///
    /// # Errors
    /// Returns `GeometryError::InvalidMediaBox` for non-positive dimensions
    /// and `GeometryError::InvalidRotation` for rotations that are not a
    /// multiple of 90 degrees.
    pub fn new(media_width: f64, media_height: f64, rotate: i64) -> Result<Self, GeometryError> {
        if media_width <= 0.0 {
            return Err(GeometryError::InvalidMediaBox(media_width));
        }
        if media_height <= 0.0 {
            return Err(GeometryError::InvalidMediaBox(media_height));
        }
        Ok(Self {
            media_width,
            media_height,
            rotation: PageRotation::from_degrees(rotate)?,
        })
    }

    /// Media box width in content-stream space
    pub fn media_width(&self) -> f64 {
        self.media_width
    }

    /// Media box height in content-stream space
    pub fn media_height(&self) -> f64 {
        self.media_height
    }

    /// The page rotation
    pub fn rotation(&self) -> PageRotation {
        self.rotation
    }

    /// Page dimensions as displayed: `(W, H)` for 0°/180°, `(H, W)` for
    /// 90°/270°
    pub fn visual_dimensions(&self) -> (f64, f64) {
        if self.rotation.swaps_axes() {
            (self.media_height, self.media_width)
        } else {
            (self.media_width, self.media_height)
        }
    }

    /// Map a visual-space point into content-stream space
    pub fn visual_point_to_content(&self, p: Point) -> Point {
        let (w, h) = (self.media_width, self.media_height);
        match self.rotation {
            PageRotation::None => p,
            PageRotation::Quarter => Point::new(h - p.y, p.x),
            PageRotation::Half => Point::new(w - p.x, h - p.y),
            PageRotation::ThreeQuarter => Point::new(p.y, h - p.x),
        }
    }

    /// Map a content-stream point into visual space
    pub fn content_point_to_visual(&self, p: Point) -> Point {
        let (w, h) = (self.media_width, self.media_height);
        match self.rotation {
            PageRotation::None => p,
            PageRotation::Quarter => Point::new(p.y, h - p.x),
            PageRotation::Half => Point::new(w - p.x, h - p.y),
            PageRotation::ThreeQuarter => Point::new(h - p.y, p.x),
        }
    }

    /// Map a visual-space rectangle into content-stream space
    ///
    /// Corners are transformed individually and the result normalized, so
    /// axis-swapping rotations produce a well-formed rectangle.
    pub fn visual_to_content(&self, rect: &Rect) -> Rect {
        let a = self.visual_point_to_content(Point::new(rect.left, rect.bottom));
        let b = self.visual_point_to_content(Point::new(rect.right, rect.top));
        Rect::from_corners(a.x, a.y, b.x, b.y)
    }

    /// Map a content-stream rectangle into visual space
    pub fn content_to_visual(&self, rect: &Rect) -> Rect {
        let a = self.content_point_to_visual(Point::new(rect.left, rect.bottom));
        let b = self.content_point_to_visual(Point::new(rect.right, rect.top));
        Rect::from_corners(a.x, a.y, b.x, b.y)
    }
}
