//! Error types for font decoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building fonts from resource dictionaries
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontError {
    #[error("Font resource not found: {0}")]
    NotFound(String),

    #[error("Malformed font dictionary: {0}")]
    MalformedDictionary(String),

    #[error("Malformed CMap: {0}")]
    MalformedCMap(String),

    #[error("Unsupported font feature: {0}")]
    Unsupported(String),
}

impl FontError {
    /// Get error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            FontError::NotFound(_) => "FONT_NOT_FOUND",
            FontError::MalformedDictionary(_) => "FONT_MALFORMED_DICT",
            FontError::MalformedCMap(_) => "FONT_MALFORMED_CMAP",
            FontError::Unsupported(_) => "FONT_UNSUPPORTED",
        }
    }
}
