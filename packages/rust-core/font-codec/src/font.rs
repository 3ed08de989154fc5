//! Font model and per-page registry
//!
//! Builds a [`Font`] for every entry in a page's (or Form XObject's)
//! `/Resources /Font` dictionary and exposes the one operation the redaction
//! pipeline needs: splitting raw show-operand bytes into codes with CID,
//! Unicode and width attached.
//!
//! Font *programs* are never opened; everything here comes from the PDF-level
//! dictionaries, encodings and CMaps. When a ToUnicode CMap is present it is
//! authoritative for Unicode; the encoding tables otherwise, and CID fonts
//! without ToUnicode read as the replacement character.

use crate::cmap::{CMap, ToUnicodeCMap};
use crate::encoding::{BaseEncoding, ByteEncoding};
use crate::error::FontError;
use crate::widths::{CidWidths, SimpleWidths};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

/// Default ascent/descent in glyph-space units when the descriptor omits them
const DEFAULT_ASCENT: f64 = 750.0;
const DEFAULT_DESCENT: f64 = -250.0;

/// Unicode replacement character for unresolvable codes
pub const REPLACEMENT: &str = "\u{FFFD}";

/// Font classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// One-byte font (Type1, TrueType, MMType1)
    Simple,
    /// Composite font with a CIDFontType0 descendant
    CidType0,
    /// Composite font with a CIDFontType2 descendant
    CidType2,
    /// Type 3 font; show operations under it are preserved, never redacted
    Type3,
}

/// One decoded code unit of a show-operand
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCode {
    /// Raw operand bytes for this code (1 or 2 bytes in practice)
    pub bytes: Vec<u8>,
    /// The character code as read from the operand
    pub code: u32,
    /// CID for composite fonts; equal to `code` for simple fonts
    pub cid: u32,
    /// Unicode text; possibly multi-codepoint (ligatures), U+FFFD if unknown
    pub unicode: String,
    /// Advance width in glyph-space units (1/1000 em)
    pub width: f64,
}

enum FontTables {
    Simple {
        encoding: ByteEncoding,
        widths: SimpleWidths,
    },
    Composite {
        cmap: CMap,
        widths: CidWidths,
    },
}

/// A resolved font: the decoding view of one `/Font` resource entry
pub struct Font {
    resource_name: String,
    base_font: String,
    kind: FontKind,
    tables: FontTables,
    to_unicode: Option<ToUnicodeCMap>,
    ascent: f64,
    descent: f64,
}

impl Font {
    /// The resource name this font is registered under (`/F1`)
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// The `/BaseFont` name
    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Font classification
    pub fn kind(&self) -> FontKind {
        self.kind
    }

    /// Whether operand bytes split into multi-byte codes
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FontKind::CidType0 | FontKind::CidType2)
    }

    /// Ascent in glyph-space units
    pub fn ascent(&self) -> f64 {
        self.ascent
    }

    /// Descent in glyph-space units (negative below the baseline)
    pub fn descent(&self) -> f64 {
        self.descent
    }

    /// Writing mode: 0 horizontal, 1 vertical (composite fonts only)
    pub fn writing_mode(&self) -> u8 {
        match &self.tables {
            FontTables::Composite { cmap, .. } => cmap.writing_mode(),
            FontTables::Simple { .. } => 0,
        }
    }

    /// Split operand bytes into decoded codes
    ///
    /// Simple fonts consume one byte per code; composite fonts follow the
    /// encoding CMap's codespace ranges. A truncated trailing code (odd byte
    /// against a two-byte codespace) is decoded with zero padding, matching
    /// the hex-string padding rule.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Vec<DecodedCode> {
        match &self.tables {
            FontTables::Simple { encoding, widths } => bytes
                .iter()
                .map(|&b| {
                    let unicode = self
                        .to_unicode
                        .as_ref()
                        .and_then(|tu| tu.unicode(b as u32))
                        .or_else(|| encoding.unicode(b).map(str::to_string))
                        .unwrap_or_else(|| REPLACEMENT.to_string());
                    DecodedCode {
                        bytes: vec![b],
                        code: b as u32,
                        cid: b as u32,
                        unicode,
                        width: widths.width(b),
                    }
                })
                .collect(),
            FontTables::Composite { cmap, widths } => {
                let mut out = Vec::new();
                let mut rest = bytes;
                while !rest.is_empty() {
                    let (code, len) = cmap.next_code(rest);
                    let cid = cmap.cid(code, len);
                    let unicode = self
                        .to_unicode
                        .as_ref()
                        .and_then(|tu| tu.unicode(code))
                        .unwrap_or_else(|| REPLACEMENT.to_string());
                    out.push(DecodedCode {
                        bytes: rest[..len.min(rest.len())].to_vec(),
                        code,
                        cid,
                        unicode,
                        width: widths.width(cid),
                    });
                    rest = &rest[len.min(rest.len())..];
                }
                out
            }
        }
    }
}

/// Per-page font table keyed by resource name
#[derive(Default)]
pub struct FontRegistry {
    fonts: HashMap<String, Font>,
}

impl FontRegistry {
    /// Build the registry from a resource dictionary
    ///
    /// Broken font entries are skipped and reported; the registry stays
    /// usable for the fonts that did resolve.
    pub fn from_resources(doc: &Document, resources: &Dictionary) -> (Self, Vec<FontError>) {
        let mut registry = FontRegistry::default();
        let mut errors = Vec::new();

        let font_dict = resources
            .get(b"Font")
            .ok()
            .map(|obj| resolve_ref(doc, obj))
            .and_then(|obj| obj.as_dict().ok());
        let Some(font_dict) = font_dict else {
            return (registry, errors);
        };

        for (name_bytes, entry) in font_dict.iter() {
            let name = String::from_utf8_lossy(name_bytes).to_string();
            let entry = resolve_ref(doc, entry);
            match entry.as_dict() {
                Ok(dict) => match build_font(doc, &name, dict) {
                    Ok(font) => {
                        registry.fonts.insert(name, font);
                    }
                    Err(e) => errors.push(e),
                },
                Err(_) => errors.push(FontError::MalformedDictionary(format!(
                    "font /{} is not a dictionary",
                    name
                ))),
            }
        }
        (registry, errors)
    }

    /// Look up a font by resource name
    pub fn get(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name)
    }

    /// Number of resolved fonts
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether no fonts resolved
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

// ============================================================================
// Dictionary walking
// ============================================================================

fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn name_of(doc: &Document, obj: &Object) -> Option<String> {
    resolve_ref(doc, obj)
        .as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).to_string())
}

fn stream_bytes(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    let stream = resolve_ref(doc, obj).as_stream().ok()?;
    stream
        .decompressed_content()
        .ok()
        .or_else(|| Some(stream.content.clone()))
}

fn build_font(doc: &Document, resource_name: &str, dict: &Dictionary) -> Result<Font, FontError> {
    let subtype = dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| name_of(doc, o))
        .ok_or_else(|| {
            FontError::MalformedDictionary(format!("font /{} has no Subtype", resource_name))
        })?;

    let base_font = dict
        .get(b"BaseFont")
        .ok()
        .and_then(|o| name_of(doc, o))
        .unwrap_or_else(|| resource_name.to_string());

    let to_unicode = dict
        .get(b"ToUnicode")
        .ok()
        .and_then(|o| stream_bytes(doc, o))
        .and_then(|data| ToUnicodeCMap::parse(&data).ok())
        .filter(|tu| !tu.is_empty());

    if subtype == "Type0" {
        build_composite_font(doc, resource_name, dict, base_font, to_unicode)
    } else {
        let kind = if subtype == "Type3" {
            FontKind::Type3
        } else {
            FontKind::Simple
        };
        build_simple_font(doc, resource_name, dict, base_font, to_unicode, kind)
    }
}

fn build_simple_font(
    doc: &Document,
    resource_name: &str,
    dict: &Dictionary,
    base_font: String,
    to_unicode: Option<ToUnicodeCMap>,
    kind: FontKind,
) -> Result<Font, FontError> {
    // Encoding priority: /Encoding dict with /Differences, then a named base
    // encoding, then the built-in default. Font programs are never opened,
    // so the built-in default is StandardEncoding.
    let mut encoding = ByteEncoding::from_base(BaseEncoding::Standard);
    if let Ok(enc_obj) = dict.get(b"Encoding") {
        let enc_obj = resolve_ref(doc, enc_obj);
        match enc_obj {
            Object::Name(name) => {
                let name = String::from_utf8_lossy(name);
                if let Some(base) = BaseEncoding::from_name(&name) {
                    encoding = ByteEncoding::from_base(base);
                }
            }
            Object::Dictionary(enc_dict) => {
                if let Some(base) = enc_dict
                    .get(b"BaseEncoding")
                    .ok()
                    .and_then(|o| name_of(doc, o))
                    .and_then(|n| BaseEncoding::from_name(&n))
                {
                    encoding = ByteEncoding::from_base(base);
                }
                if let Ok(diff_obj) = enc_dict.get(b"Differences") {
                    let differences = parse_differences(doc, resolve_ref(doc, diff_obj))?;
                    encoding.apply_differences(&differences);
                }
            }
            _ => {}
        }
    }

    let descriptor = dict
        .get(b"FontDescriptor")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok());
    let (ascent, descent) = descriptor_metrics(descriptor);
    let missing_width = descriptor
        .and_then(|d| d.get(b"MissingWidth").ok())
        .and_then(object_to_f64)
        .unwrap_or(0.0);

    let first_char = dict.get(b"FirstChar").ok().and_then(|o| o.as_i64().ok());
    let widths_array: Option<Vec<f64>> = dict
        .get(b"Widths")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| object_to_f64(resolve_ref(doc, o)).unwrap_or(0.0))
                .collect()
        });

    let widths = match (first_char, widths_array) {
        (Some(first), Some(values)) if !values.is_empty() => {
            SimpleWidths::from_widths_array(first as u32, &values, missing_width)
        }
        _ => {
            // Standard 14 path: estimate from the encoding's Unicode view
            let enc = encoding.clone();
            SimpleWidths::estimated(&base_font, move |b| {
                enc.unicode(b).and_then(|s| s.chars().next())
            })
        }
    };

    Ok(Font {
        resource_name: resource_name.to_string(),
        base_font,
        kind,
        tables: FontTables::Simple { encoding, widths },
        to_unicode,
        ascent,
        descent,
    })
}

fn build_composite_font(
    doc: &Document,
    resource_name: &str,
    dict: &Dictionary,
    base_font: String,
    to_unicode: Option<ToUnicodeCMap>,
) -> Result<Font, FontError> {
    let cmap = match dict.get(b"Encoding").ok().map(|o| resolve_ref(doc, o)) {
        Some(Object::Name(name)) => CMap::predefined(&String::from_utf8_lossy(name)),
        Some(obj @ Object::Stream(_)) => {
            let data = stream_bytes(doc, obj).ok_or_else(|| {
                FontError::MalformedCMap(format!(
                    "font /{} has an undecodable encoding CMap",
                    resource_name
                ))
            })?;
            CMap::parse(&data)?
        }
        _ => CMap::identity(0),
    };

    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .ok_or_else(|| {
            FontError::MalformedDictionary(format!(
                "Type0 font /{} has no descendant font",
                resource_name
            ))
        })?;

    let kind = match descendant
        .get(b"Subtype")
        .ok()
        .and_then(|o| name_of(doc, o))
        .as_deref()
    {
        Some("CIDFontType0") => FontKind::CidType0,
        _ => FontKind::CidType2,
    };

    let descriptor = descendant
        .get(b"FontDescriptor")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok());
    let (ascent, descent) = descriptor_metrics(descriptor);

    let default_width = descendant
        .get(b"DW")
        .ok()
        .and_then(|o| object_to_f64(resolve_ref(doc, o)))
        .unwrap_or(1000.0);
    let mut widths = CidWidths::with_default(default_width);
    if let Some(w_array) = descendant
        .get(b"W")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        parse_w_array(doc, w_array, &mut widths);
    }

    Ok(Font {
        resource_name: resource_name.to_string(),
        base_font,
        kind,
        tables: FontTables::Composite { cmap, widths },
        to_unicode,
        ascent,
        descent,
    })
}

fn descriptor_metrics(descriptor: Option<&Dictionary>) -> (f64, f64) {
    let ascent = descriptor
        .and_then(|d| d.get(b"Ascent").ok())
        .and_then(object_to_f64)
        .filter(|a| *a != 0.0)
        .unwrap_or(DEFAULT_ASCENT);
    let descent = descriptor
        .and_then(|d| d.get(b"Descent").ok())
        .and_then(object_to_f64)
        .filter(|d| *d != 0.0)
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}

fn parse_differences(doc: &Document, obj: &Object) -> Result<Vec<(u8, String)>, FontError> {
    let arr = obj
        .as_array()
        .map_err(|_| FontError::MalformedDictionary("Differences is not an array".to_string()))?;
    let mut out = Vec::new();
    let mut code: i64 = 0;
    for item in arr {
        match resolve_ref(doc, item) {
            Object::Integer(n) => code = *n,
            Object::Name(name) => {
                if (0..=255).contains(&code) {
                    out.push((code as u8, String::from_utf8_lossy(name).to_string()));
                }
                code += 1;
            }
            _ => {}
        }
    }
    Ok(out)
}

/// Parse a CID `/W` array: `c [w0 w1 ...]` and `c_first c_last w` forms mixed
fn parse_w_array(doc: &Document, arr: &[Object], widths: &mut CidWidths) {
    let mut i = 0;
    while i < arr.len() {
        let Some(first) = object_to_f64(resolve_ref(doc, &arr[i])) else {
            i += 1;
            continue;
        };
        match arr.get(i + 1).map(|o| resolve_ref(doc, o)) {
            Some(Object::Array(values)) => {
                for (offset, value) in values.iter().enumerate() {
                    if let Some(w) = object_to_f64(resolve_ref(doc, value)) {
                        widths.insert(first as u32 + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last_obj) => {
                let last = object_to_f64(last_obj);
                let width = arr.get(i + 2).map(|o| resolve_ref(doc, o)).and_then(object_to_f64);
                if let (Some(last), Some(width)) = (last, width) {
                    widths.insert_range(first as u32, last as u32, width);
                }
                i += 3;
            }
            None => break,
        }
    }
}
