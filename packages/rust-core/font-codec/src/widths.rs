//! Glyph width tables
//!
//! Widths are kept in glyph-space units (1/1000 of the font size), the unit
//! both `/Widths` arrays and CID `/W` arrays use. Simple fonts get a dense
//! 256-entry table; composite fonts get the sparse single/range structure of
//! `/W` with `/DW` as default.
//!
//! Standard 14 fonts carry no `/Widths` array; for those the per-character
//! estimates below (derived from the Adobe Font Metrics) keep glyph boxes
//! close enough for rectangle tests.

use std::collections::HashMap;

/// Dense width table for a simple (one-byte) font
#[derive(Debug, Clone)]
pub struct SimpleWidths {
    widths: Vec<f64>,
    missing_width: f64,
}

impl SimpleWidths {
    /// Build from a `/Widths` array starting at `first_char`
    pub fn from_widths_array(first_char: u32, widths: &[f64], missing_width: f64) -> Self {
        let mut table = vec![f64::NAN; 256];
        for (i, w) in widths.iter().enumerate() {
            let code = first_char as usize + i;
            if code < 256 {
                table[code] = *w;
            }
        }
        Self {
            widths: table,
            missing_width,
        }
    }

    /// Build an estimated table for a Standard 14 font without `/Widths`
    ///
    /// The byte→Unicode view of the font's encoding drives the estimate, so
    /// re-encoded codes still measure as the character they render.
    pub fn estimated(base_font: &str, unicode_of: impl Fn(u8) -> Option<char>) -> Self {
        let mut table = vec![f64::NAN; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            if let Some(c) = unicode_of(code as u8) {
                *slot = standard_14_width(c, base_font);
            }
        }
        Self {
            widths: table,
            missing_width: 500.0,
        }
    }

    /// Width for a byte code in glyph-space units
    pub fn width(&self, code: u8) -> f64 {
        let w = self.widths[code as usize];
        if w.is_nan() {
            self.missing_width
        } else {
            w
        }
    }
}

/// Sparse width table for a composite (CID) font
#[derive(Debug, Clone)]
pub struct CidWidths {
    default_width: f64,
    singles: HashMap<u32, f64>,
    ranges: Vec<(u32, u32, f64)>,
}

impl CidWidths {
    /// Create with only a default width (`/DW`, 1000 when absent)
    pub fn with_default(default_width: f64) -> Self {
        Self {
            default_width,
            singles: HashMap::new(),
            ranges: Vec::new(),
        }
    }

    /// Record an explicit width for one CID (`/W` form `c [w0 w1 ...]`)
    pub fn insert(&mut self, cid: u32, width: f64) {
        self.singles.insert(cid, width);
    }

    /// Record a run of equal widths (`/W` form `c_first c_last w`)
    pub fn insert_range(&mut self, first: u32, last: u32, width: f64) {
        self.ranges.push((first, last, width));
    }

    /// Width for a CID in glyph-space units
    pub fn width(&self, cid: u32) -> f64 {
        if let Some(&w) = self.singles.get(&cid) {
            return w;
        }
        for &(first, last, w) in &self.ranges {
            if cid >= first && cid <= last {
                return w;
            }
        }
        self.default_width
    }
}

/// Estimated character width for Standard 14 fonts, in glyph-space units
///
/// Courier is monospaced; Times and Helvetica use per-class estimates from
/// the Adobe Font Metrics. Helvetica doubles as the fallback for unknown
/// base fonts.
pub fn standard_14_width(c: char, base_font: &str) -> f64 {
    if base_font.starts_with("Courier") {
        600.0
    } else if base_font.starts_with("Times") {
        times_width(c)
    } else {
        helvetica_width(c)
    }
}

fn times_width(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 250.0,
        'I' | 'f' | 't' | 'r' => 350.0,
        ' ' => 250.0,
        'c' | 's' | 'z' => 440.0,
        'J' => 330.0,
        'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'k' | 'n' | 'o' | 'p' | 'q' | 'u' | 'v' | 'x' | 'y' => {
            500.0
        }
        'm' => 830.0,
        'w' => 720.0,
        'A' | 'B' | 'E' | 'F' | 'K' | 'L' | 'P' | 'R' | 'S' | 'T' | 'X' | 'Y' | 'Z' => 670.0,
        'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'U' | 'V' => 720.0,
        'M' | 'W' => 890.0,
        '0'..='9' => 500.0,
        '-' | '(' | ')' | '[' | ']' | '{' | '}' => 330.0,
        '/' | '\\' => 280.0,
        '+' | '=' | '<' | '>' => 560.0,
        '@' => 830.0,
        '#' | '$' | '%' | '&' | '*' => 500.0,
        _ => 500.0,
    }
}

fn helvetica_width(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 280.0,
        'I' | 'f' | 't' | 'r' => 330.0,
        ' ' => 280.0,
        'c' | 's' | 'z' | 'J' => 500.0,
        'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'k' | 'n' | 'o' | 'p' | 'q' | 'u' | 'v' | 'x' | 'y' => {
            560.0
        }
        'm' | 'w' => 830.0,
        'A'..='L' | 'N'..='V' | 'X'..='Z' => 670.0,
        'M' | 'W' => 830.0,
        '0'..='9' => 560.0,
        '-' | '(' | ')' | '[' | ']' | '{' | '}' => 330.0,
        '/' | '\\' => 280.0,
        '+' | '=' | '<' | '>' => 580.0,
        '@' | '#' | '$' | '%' | '&' | '*' => 670.0,
        _ => 560.0,
    }
}
