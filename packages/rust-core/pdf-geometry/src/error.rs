//! Error types for geometry validation

use thiserror::Error;

/// Validation errors for geometry types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Page rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),
    #[error("Media box dimension must be positive, got {0}")]
    InvalidMediaBox(f64),
}
