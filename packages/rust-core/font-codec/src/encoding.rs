//! Simple-font encodings
//!
//! A simple (one-byte) font maps each code 0-255 to a glyph. The byte→Unicode
//! view of that mapping comes from a named base encoding, optionally patched
//! by a `/Differences` array of glyph names. Codes with no entry decode to
//! the Unicode replacement character downstream.
//!
//! Tables cover the ranges these encodings actually define; MacExpertEncoding
//! resolves only its commonly-encountered subset (figures and punctuation),
//! the expert-set ornaments stay unmapped.

use crate::glyph_names::glyph_name_to_unicode;
use once_cell::sync::Lazy;

/// Named base encodings recognized in `/Encoding` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    MacExpert,
    PdfDoc,
}

impl BaseEncoding {
    /// Parse a `/Encoding` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(BaseEncoding::Standard),
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            "MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            "MacExpertEncoding" => Some(BaseEncoding::MacExpert),
            "PDFDocEncoding" => Some(BaseEncoding::PdfDoc),
            _ => None,
        }
    }

    /// The encoding's byte→Unicode table
    pub fn unicode_table(&self) -> &'static [Option<char>; 256] {
        match self {
            BaseEncoding::Standard => &STANDARD,
            BaseEncoding::WinAnsi => &WIN_ANSI,
            BaseEncoding::MacRoman => &MAC_ROMAN,
            BaseEncoding::MacExpert => &MAC_EXPERT,
            BaseEncoding::PdfDoc => &PDF_DOC,
        }
    }
}

/// A resolved byte→Unicode map for one simple font
///
/// Entries are `String` because a `/Differences` name may expand to more
/// than one codepoint (`/uni00660069`).
#[derive(Debug, Clone)]
pub struct ByteEncoding {
    table: Vec<Option<String>>,
}

impl ByteEncoding {
    /// Build from a base encoding table
    pub fn from_base(base: BaseEncoding) -> Self {
        let table = base
            .unicode_table()
            .iter()
            .map(|c| c.map(|c| c.to_string()))
            .collect();
        Self { table }
    }

    /// Patch codes from a `/Differences` list of `(code, glyph name)` pairs
    ///
    /// Names that resolve via the glyph-name tables replace the base entry;
    /// unknown names clear the entry so the code reads as unresolved.
    pub fn apply_differences(&mut self, differences: &[(u8, String)]) {
        for (code, name) in differences {
            self.table[*code as usize] = glyph_name_to_unicode(name);
        }
    }

    /// Unicode for a byte code, if the encoding defines it
    pub fn unicode(&self, code: u8) -> Option<&str> {
        self.table[code as usize].as_deref()
    }
}

fn ascii_base() -> [Option<char>; 256] {
    let mut t = [None; 256];
    for b in 0x20u32..=0x7E {
        t[b as usize] = char::from_u32(b);
    }
    t
}

static STANDARD: Lazy<[Option<char>; 256]> = Lazy::new(|| {
    let mut t = ascii_base();
    // Adobe StandardEncoding deviates from ASCII for the quote characters
    t[0x27] = Some('\u{2019}');
    t[0x60] = Some('\u{2018}');
    let high: &[(u8, char)] = &[
        (0xA1, '\u{00A1}'),
        (0xA2, '\u{00A2}'),
        (0xA3, '\u{00A3}'),
        (0xA4, '\u{2044}'),
        (0xA5, '\u{00A5}'),
        (0xA6, '\u{0192}'),
        (0xA7, '\u{00A7}'),
        (0xA8, '\u{00A4}'),
        (0xA9, '\''),
        (0xAA, '\u{201C}'),
        (0xAB, '\u{00AB}'),
        (0xAC, '\u{2039}'),
        (0xAD, '\u{203A}'),
        (0xAE, '\u{FB01}'),
        (0xAF, '\u{FB02}'),
        (0xB1, '\u{2013}'),
        (0xB2, '\u{2020}'),
        (0xB3, '\u{2021}'),
        (0xB4, '\u{00B7}'),
        (0xB6, '\u{00B6}'),
        (0xB7, '\u{2022}'),
        (0xB8, '\u{201A}'),
        (0xB9, '\u{201E}'),
        (0xBA, '\u{201D}'),
        (0xBB, '\u{00BB}'),
        (0xBC, '\u{2026}'),
        (0xBD, '\u{2030}'),
        (0xBF, '\u{00BF}'),
        (0xC1, '`'),
        (0xC2, '\u{00B4}'),
        (0xC3, '\u{02C6}'),
        (0xC4, '\u{02DC}'),
        (0xC5, '\u{00AF}'),
        (0xC6, '\u{02D8}'),
        (0xC7, '\u{02D9}'),
        (0xC8, '\u{00A8}'),
        (0xCA, '\u{02DA}'),
        (0xCB, '\u{00B8}'),
        (0xCD, '\u{02DD}'),
        (0xCE, '\u{02DB}'),
        (0xCF, '\u{02C7}'),
        (0xD0, '\u{2014}'),
        (0xE1, '\u{00C6}'),
        (0xE3, '\u{00AA}'),
        (0xE8, '\u{0141}'),
        (0xE9, '\u{00D8}'),
        (0xEA, '\u{0152}'),
        (0xEB, '\u{00BA}'),
        (0xF1, '\u{00E6}'),
        (0xF5, '\u{0131}'),
        (0xF8, '\u{0142}'),
        (0xF9, '\u{00F8}'),
        (0xFA, '\u{0153}'),
        (0xFB, '\u{00DF}'),
    ];
    for &(code, c) in high {
        t[code as usize] = Some(c);
    }
    t
});

static WIN_ANSI: Lazy<[Option<char>; 256]> = Lazy::new(|| {
    let mut t = ascii_base();
    // Latin-1 upper half
    for b in 0xA0u32..=0xFF {
        t[b as usize] = char::from_u32(b);
    }
    // cp1252 specials in 0x80..0x9F (holes stay unmapped)
    let specials: &[(u8, char)] = &[
        (0x80, '\u{20AC}'),
        (0x82, '\u{201A}'),
        (0x83, '\u{0192}'),
        (0x84, '\u{201E}'),
        (0x85, '\u{2026}'),
        (0x86, '\u{2020}'),
        (0x87, '\u{2021}'),
        (0x88, '\u{02C6}'),
        (0x89, '\u{2030}'),
        (0x8A, '\u{0160}'),
        (0x8B, '\u{2039}'),
        (0x8C, '\u{0152}'),
        (0x8E, '\u{017D}'),
        (0x91, '\u{2018}'),
        (0x92, '\u{2019}'),
        (0x93, '\u{201C}'),
        (0x94, '\u{201D}'),
        (0x95, '\u{2022}'),
        (0x96, '\u{2013}'),
        (0x97, '\u{2014}'),
        (0x98, '\u{02DC}'),
        (0x99, '\u{2122}'),
        (0x9A, '\u{0161}'),
        (0x9B, '\u{203A}'),
        (0x9C, '\u{0153}'),
        (0x9E, '\u{017E}'),
        (0x9F, '\u{0178}'),
    ];
    for &(code, c) in specials {
        t[code as usize] = Some(c);
    }
    t
});

static MAC_ROMAN: Lazy<[Option<char>; 256]> = Lazy::new(|| {
    let mut t = ascii_base();
    const HIGH: [char; 128] = [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}',
        '\u{00E1}', '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}',
        '\u{00E9}', '\u{00E8}', '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}',
        '\u{00EF}', '\u{00F1}', '\u{00F3}', '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}',
        '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}', '\u{2020}', '\u{00B0}', '\u{00A2}',
        '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}', '\u{00AE}', '\u{00A9}',
        '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{00C6}', '\u{00D8}', '\u{221E}',
        '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{00E6}',
        '\u{00F8}', '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}',
        '\u{2206}', '\u{00AB}', '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}',
        '\u{00D5}', '\u{0152}', '\u{0153}', '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}',
        '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}', '\u{00FF}', '\u{0178}', '\u{2044}',
        '\u{20AC}', '\u{2039}', '\u{203A}', '\u{FB01}', '\u{FB02}', '\u{2021}', '\u{00B7}',
        '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}', '\u{00CB}',
        '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}',
        '\u{02DC}', '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}',
        '\u{02DB}', '\u{02C7}',
    ];
    for (i, &c) in HIGH.iter().enumerate() {
        t[0x80 + i] = Some(c);
    }
    t
});

static MAC_EXPERT: Lazy<[Option<char>; 256]> = Lazy::new(|| {
    let mut t = [None; 256];
    t[0x20] = Some(' ');
    // Oldstyle figures and expert punctuation read as their plain forms
    for b in 0x30u32..=0x39 {
        t[b as usize] = char::from_u32(b);
    }
    t[0x2C] = Some(',');
    t[0x2E] = Some('.');
    t[0x2D] = Some('-');
    t[0x24] = Some('$');
    t[0x3A] = Some(':');
    t[0x3B] = Some(';');
    t
});

static PDF_DOC: Lazy<[Option<char>; 256]> = Lazy::new(|| {
    let mut t = ascii_base();
    for b in 0xA1u32..=0xFF {
        t[b as usize] = char::from_u32(b);
    }
    t[0xA0] = Some('\u{20AC}');
    let low: &[(u8, char)] = &[
        (0x18, '\u{02D8}'),
        (0x19, '\u{02C7}'),
        (0x1A, '\u{02C6}'),
        (0x1B, '\u{02D9}'),
        (0x1C, '\u{02DD}'),
        (0x1D, '\u{02DB}'),
        (0x1E, '\u{02DA}'),
        (0x1F, '\u{00B8}'),
    ];
    let specials: &[(u8, char)] = &[
        (0x80, '\u{2022}'),
        (0x81, '\u{2020}'),
        (0x82, '\u{2021}'),
        (0x83, '\u{2026}'),
        (0x84, '\u{2014}'),
        (0x85, '\u{2013}'),
        (0x86, '\u{0192}'),
        (0x87, '\u{2044}'),
        (0x88, '\u{2039}'),
        (0x89, '\u{203A}'),
        (0x8A, '\u{2212}'),
        (0x8B, '\u{2030}'),
        (0x8C, '\u{201E}'),
        (0x8D, '\u{201C}'),
        (0x8E, '\u{201D}'),
        (0x8F, '\u{2018}'),
        (0x90, '\u{2019}'),
        (0x91, '\u{201A}'),
        (0x92, '\u{2122}'),
        (0x93, '\u{FB01}'),
        (0x94, '\u{FB02}'),
        (0x95, '\u{0141}'),
        (0x96, '\u{0152}'),
        (0x97, '\u{0160}'),
        (0x98, '\u{0178}'),
        (0x99, '\u{017D}'),
        (0x9A, '\u{0131}'),
        (0x9B, '\u{0142}'),
        (0x9C, '\u{0153}'),
        (0x9D, '\u{0161}'),
        (0x9E, '\u{017E}'),
    ];
    for &(code, c) in low.iter().chain(specials) {
        t[code as usize] = Some(c);
    }
    t
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            BaseEncoding::from_name("WinAnsiEncoding"),
            Some(BaseEncoding::WinAnsi)
        );
        assert_eq!(BaseEncoding::from_name("NoSuchEncoding"), None);
    }

    #[test]
    fn test_ascii_range_shared() {
        for base in [
            BaseEncoding::Standard,
            BaseEncoding::WinAnsi,
            BaseEncoding::MacRoman,
            BaseEncoding::PdfDoc,
        ] {
            let t = base.unicode_table();
            assert_eq!(t[b'A' as usize], Some('A'));
            assert_eq!(t[b' ' as usize], Some(' '));
        }
    }

    #[test]
    fn test_standard_quotes_differ_from_ascii() {
        let t = BaseEncoding::Standard.unicode_table();
        assert_eq!(t[0x27], Some('\u{2019}'));
        assert_eq!(t[0x60], Some('\u{2018}'));
        // WinAnsi keeps the ASCII characters
        let t = BaseEncoding::WinAnsi.unicode_table();
        assert_eq!(t[0x27], Some('\''));
    }

    #[test]
    fn test_win_ansi_cp1252_specials() {
        let t = BaseEncoding::WinAnsi.unicode_table();
        assert_eq!(t[0x80], Some('\u{20AC}'));
        assert_eq!(t[0x93], Some('\u{201C}'));
        assert_eq!(t[0x81], None); // cp1252 hole
        assert_eq!(t[0xE9], Some('\u{00E9}'));
    }

    #[test]
    fn test_mac_roman_high_half() {
        let t = BaseEncoding::MacRoman.unicode_table();
        assert_eq!(t[0x80], Some('\u{00C4}'));
        assert_eq!(t[0x8E], Some('\u{00E9}'));
        assert_eq!(t[0xD0], Some('\u{2013}'));
        assert_eq!(t[0xDE], Some('\u{FB01}')); // fi ligature
    }

    #[test]
    fn test_pdf_doc_specials() {
        let t = BaseEncoding::PdfDoc.unicode_table();
        assert_eq!(t[0xA0], Some('\u{20AC}'));
        assert_eq!(t[0x84], Some('\u{2014}'));
        assert_eq!(t[0xE9], Some('\u{00E9}'));
    }

    #[test]
    fn test_byte_encoding_differences_override() {
        let mut enc = ByteEncoding::from_base(BaseEncoding::WinAnsi);
        assert_eq!(enc.unicode(0x41), Some("A"));
        enc.apply_differences(&[(0x41, "Adieresis".to_string())]);
        assert_eq!(enc.unicode(0x41), Some("Ä"));
    }

    #[test]
    fn test_byte_encoding_unknown_difference_clears() {
        let mut enc = ByteEncoding::from_base(BaseEncoding::WinAnsi);
        enc.apply_differences(&[(0x42, "notaglyph".to_string())]);
        assert_eq!(enc.unicode(0x42), None);
    }

    #[test]
    fn test_mac_expert_is_sparse() {
        let t = BaseEncoding::MacExpert.unicode_table();
        assert_eq!(t[0x30], Some('0'));
        assert_eq!(t[0x41], None);
    }
}
