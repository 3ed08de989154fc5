//! Glyph-level PDF redaction
//!
//! This crate removes glyphs from PDF content streams so that redacted
//! characters are gone from the document's rendering program, not merely
//! covered up. Text extraction over the output cannot recover them, while
//! the surrounding typography (positioning, spacing, line breaks) stays
//! visually identical.
//!
//! # Pipeline
//!
//! ```text
//! tokenizer → interpreter → {font-codec, glyphs}   build the operation stream
//!      correlator (+ external letters)             build the removal plan
//!      rewriter (+ marker)                         emit the new stream
//!      document adapter                            container I/O + XObjects
//! ```
//!
//! # Architecture
//!
//! The crate is organized into focused modules:
//!
//! - `tokenizer` - byte-level content stream scanner with exact token ranges
//! - `interpreter` - operator state machine producing the operation stream
//! - `glyphs` - show-operand expansion into positioned glyphs
//! - `correlator` - letter/glyph alignment and the removal plan
//! - `rewriter` - byte-fidelity stream rewriting with `Tm` re-anchoring
//! - `marker` - visual redaction rectangles
//! - `xobject` - Form XObject resolution for the recursion driver
//! - `page` - per-stream pipeline composition
//! - `document` - `lopdf` adapter ([`PdfRedactor`]), annotations, metadata
//! - `config` - [`RedactionConfig`] and removal strategies
//! - `error` - [`RedactError`], [`RedactWarning`], result records
//!
//! # Key Types
//!
//! - [`PdfRedactor`] - document-level entry point
//! - [`RedactionConfig`] - marker, strategy and recursion options
//! - [`Letter`] / [`LetterSource`] - the trusted extractor's interface
//! - [`PageReport`] / [`RedactionReport`] - per-call outcome records
//!
//! # Usage Example
//!
//! ```no_run
//! use pdf_redactor::{Letter, PdfRedactor};
//! use pdf_geometry::Rect;
//!
//! let bytes = std::fs::read("statement.pdf").unwrap();
//! let mut redactor = PdfRedactor::from_bytes(&bytes).unwrap();
//!
//! // Letters come from the trusted extractor, areas from pattern matching
//! let letters = vec![
//!     Letter::new("4", Rect::new(100.0, 700.0, 106.0, 712.0)),
//!     // ...
//! ];
//! let areas = [Rect::new(98.0, 698.0, 190.0, 714.0)];
//!
//! let report = redactor.redact_page(1, &areas, &letters, &|| false).unwrap();
//! assert!(report.glyphs_removed > 0);
//!
//! redactor.sanitize_metadata();
//! std::fs::write("statement-redacted.pdf", redactor.save_to_bytes().unwrap()).unwrap();
//! ```
//!
//! # Error Handling
//!
//! Fatal conditions ([`RedactError`]) abort the affected content stream and
//! leave the original bytes in place: malformed streams, cancellation,
//! internal invariant violations, container failures. Everything else is a
//! [`RedactWarning`] carried in the page report; warned operations pass
//! through unchanged rather than being redacted incorrectly.

pub mod config;
pub mod correlator;
pub mod document;
pub mod error;
pub mod letters;
pub mod page;
pub mod tokenizer;
pub mod unicode;

mod glyphs;
mod interpreter;
mod marker;
mod operation;
mod rewriter;
mod state;
mod xobject;

pub use config::{GlyphRemovalStrategy, MarkerColor, RedactionConfig};
pub use correlator::RemovalPlan;
pub use document::PdfRedactor;
pub use error::{PageReport, RedactError, RedactWarning, RedactionReport};
pub use letters::{Letter, LetterSource};
pub use operation::{
    Glyph, OpKind, OperandPiece, Operation, PenSensitivity, ShowOperator, ShowTextOp, TextSnapshot,
};
pub use page::{redact_content_stream, StreamOutcome};
pub use rewriter::{encode_hex_string, encode_literal_string};
pub use unicode::{normalize_for_match, normalize_for_search};
