//! External letter model
//!
//! The trusted letter extractor supplies, per page, an ordered sequence of
//! letters with Unicode text and visual-space rectangles. The core never
//! derives Unicode from fonts when letters are available; fonts are decoded
//! only to locate the *operands* carrying each letter.

use pdf_geometry::Rect;
use serde::{Deserialize, Serialize};

/// One letter reported by the extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    /// Unicode text; usually one codepoint, more for expanded ligatures
    pub unicode: String,
    /// Bounding box in visual space (post page-rotation)
    pub bounding_box: Rect,
    /// Font name, when the extractor reports one
    pub font_name: Option<String>,
}

impl Letter {
    /// Convenience constructor for tests and simple callers
    pub fn new(unicode: impl Into<String>, bounding_box: Rect) -> Self {
        Self {
            unicode: unicode.into(),
            bounding_box,
            font_name: None,
        }
    }
}

/// The letter extractor interface
///
/// Implementations must return letters ordered by content-stream reading
/// order (the order show operations appear in the stream, not visual
/// reading order) with accurate visual-space rectangles.
pub trait LetterSource {
    /// Letters for a 1-based page number
    fn letters_for_page(&self, page_number: u32) -> Vec<Letter>;
}
