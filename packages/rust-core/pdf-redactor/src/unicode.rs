//! Unicode normalization for glyph/letter matching
//!
//! Extractors and content streams frequently disagree on the exact codepoint
//! for apostrophes, dashes, spaces and ligatures. Matching runs on NFKC
//! normalization (which also expands ligatures like U+FB01 to "fi") followed
//! by a small alias fold, applied identically to both sides so the
//! correlator and the external search collaborator see the same text.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for correlator matching: NFKC plus alias folding
pub fn normalize_for_match(s: &str) -> String {
    s.nfkc().map(alias_fold).collect()
}

/// Normalize for the search collaborator; lowercases when the search is
/// case-insensitive
pub fn normalize_for_search(s: &str, case_sensitive: bool) -> String {
    let normalized = normalize_for_match(s);
    if case_sensitive {
        normalized
    } else {
        normalized.to_lowercase()
    }
}

/// Fold typographic variants onto their ASCII representative
fn alias_fold(c: char) -> char {
    match c {
        // Apostrophes and single quotes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{02BC}' | '\u{2032}' => '\'',
        // Double quotes
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        // Hyphens and dashes
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' | '\u{00AD}' => '-',
        // Spaces NFKC does not already fold
        '\u{00A0}' | '\u{202F}' | '\u{3000}' => ' ',
        other => other,
    }
}
