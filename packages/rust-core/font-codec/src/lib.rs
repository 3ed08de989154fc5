//! Font decoding toolkit for the redaction core
//!
//! Glyph-level redaction needs to know, for every text-showing operand, how
//! its raw bytes split into glyph codes, what each code renders as, and how
//! wide it is. This crate answers those questions from PDF-level font data
//! only; font programs are never opened.
//!
//! # Architecture
//!
//! The crate is organized into five modules:
//!
//! ## `font`
//! The [`Font`] model and [`FontRegistry`]: builds one decoder per entry in
//! a page's `/Resources /Font` dictionary and splits operand bytes into
//! [`DecodedCode`] values (raw bytes, CID, Unicode, width).
//!
//! ## `encoding`
//! Simple-font byte→Unicode tables: StandardEncoding, WinAnsiEncoding,
//! MacRomanEncoding, MacExpertEncoding, PDFDocEncoding, patched by
//! `/Differences` arrays.
//!
//! ## `cmap`
//! Composite-font CMaps: codespace-range driven code splitting, CID ranges,
//! and ToUnicode `bfchar`/`bfrange` lookup.
//!
//! ## `widths`
//! Width tables: dense `/Widths` arrays for simple fonts, sparse `/W` + `/DW`
//! for CID fonts, and Standard 14 estimates for fonts without metrics.
//!
//! ## `glyph_names`
//! PostScript glyph-name → Unicode resolution (Adobe Glyph List subset plus
//! the `uniXXXX`/`uXXXX` algorithmic forms).
//!
//! # Example
//!
//! ```no_run
//! use font_codec::FontRegistry;
//!
//! # let doc = lopdf::Document::with_version("1.7");
//! # let resources = lopdf::Dictionary::new();
//! let (registry, warnings) = FontRegistry::from_resources(&doc, &resources);
//! if let Some(font) = registry.get("F1") {
//!     for code in font.decode_bytes(b"Hello") {
//!         println!("{} -> {}", code.code, code.unicode);
//!     }
//! }
//! ```

mod cmap;
mod encoding;
mod error;
mod font;
mod glyph_names;
mod widths;

pub use cmap::{CMap, ToUnicodeCMap};
pub use encoding::{BaseEncoding, ByteEncoding};
pub use error::FontError;
pub use font::{DecodedCode, Font, FontKind, FontRegistry, REPLACEMENT};
pub use glyph_names::glyph_name_to_unicode;
pub use widths::{standard_14_width, CidWidths, SimpleWidths};
