//! Error and report types for redaction
//!
//! Failures split into two tiers. [`RedactError`] values are fatal for the
//! affected content stream: the caller gets no output bytes and the original
//! stream stays in place. [`RedactWarning`] values are advisory: the page is
//! still produced and the warnings ride along in the [`PageReport`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal redaction errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RedactError {
    #[error("Malformed content stream: {0}")]
    MalformedStream(String),

    #[error("PDF container error: {0}")]
    Container(String),

    #[error("Redaction cancelled")]
    Cancelled,

    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

impl RedactError {
    /// Get error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            RedactError::MalformedStream(_) => "REDACT_MALFORMED_STREAM",
            RedactError::Container(_) => "REDACT_CONTAINER_ERROR",
            RedactError::Cancelled => "REDACT_CANCELLED",
            RedactError::Internal(_) => "REDACT_INTERNAL_ERROR",
        }
    }

    /// Whether the error aborts the whole page (all of these do; the
    /// distinction matters to callers deciding whether to retry)
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RedactError::Cancelled)
    }
}

/// Non-fatal conditions recorded while processing a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RedactWarning {
    /// A show operation references a font missing from the resource scope;
    /// the operation passes through unchanged and is never redacted
    UnresolvableFont { font: String },

    /// Letters could not be aligned with an operation's glyphs; the whole
    /// operation was removed if it overlapped a redaction area
    AlignmentFailure { operation: usize },

    /// A construct the rewriter does not redact (Type 3 fonts, overlapping
    /// inline images, ActualText ranges); the operation was preserved
    UnsupportedFeature { what: String },

    /// Mismatched `q`/`Q` or `BT`/`ET` nesting in an otherwise readable
    /// stream
    UnbalancedNesting { what: String },

    /// A Form XObject references itself through its call chain
    CircularXObject { name: String },
}

impl RedactWarning {
    /// Short identifier for logs and summaries
    pub fn code(&self) -> &'static str {
        match self {
            RedactWarning::UnresolvableFont { .. } => "UNRESOLVABLE_FONT",
            RedactWarning::AlignmentFailure { .. } => "ALIGNMENT_FAILURE",
            RedactWarning::UnsupportedFeature { .. } => "UNSUPPORTED_FEATURE",
            RedactWarning::UnbalancedNesting { .. } => "UNBALANCED_NESTING",
            RedactWarning::CircularXObject { .. } => "CIRCULAR_XOBJECT",
        }
    }
}

/// Outcome of redacting one page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-based page number
    pub page_number: u32,
    /// Glyphs removed across the page and its Form XObjects
    pub glyphs_removed: usize,
    /// Show operations that were rewritten
    pub operations_rewritten: usize,
    /// Annotations removed because they intersected a redaction area
    pub annotations_removed: usize,
    /// Non-fatal conditions encountered
    pub warnings: Vec<RedactWarning>,
}

/// Outcome of a whole redaction call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionReport {
    pub pages: Vec<PageReport>,
}

impl RedactionReport {
    /// Total glyphs removed across all pages
    pub fn total_glyphs_removed(&self) -> usize {
        self.pages.iter().map(|p| p.glyphs_removed).sum()
    }

    /// Whether any warning was recorded on any page
    pub fn has_warnings(&self) -> bool {
        self.pages.iter().any(|p| !p.warnings.is_empty())
    }
}
