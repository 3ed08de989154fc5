//! Glyph name to Unicode resolution
//!
//! `/Differences` arrays and built-in encodings identify glyphs by PostScript
//! name (`/Adieresis`, `/quotesingle`). This module resolves those names to
//! Unicode using the common subset of the Adobe Glyph List plus the
//! algorithmic `uniXXXX` / `uXXXX[XX]` forms.

/// Resolve a glyph name to its Unicode string
///
/// Resolution order:
/// 1. Algorithmic forms: `uniXXXX` (4 hex digits, possibly repeated) and
///    `uXXXX`..`uXXXXXX`
/// 2. The Adobe Glyph List subset below
/// 3. Single-character names resolve to that character (`/a` → "a")
///
/// Returns `None` for names with no known mapping; callers map those to the
/// Unicode replacement character.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let mut out = String::new();
            for chunk in hex.as_bytes().chunks(4) {
                let v = u32::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
                out.push(char::from_u32(v)?);
            }
            return Some(out);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let v = u32::from_str_radix(hex, 16).ok()?;
            return char::from_u32(v).map(|c| c.to_string());
        }
    }
    if let Some(c) = agl_lookup(name) {
        return Some(c.to_string());
    }
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c.to_string());
    }
    None
}

/// Adobe Glyph List subset covering the Standard, WinAnsi, MacRoman and
/// PDFDoc encodings plus common Differences entries
fn agl_lookup(name: &str) -> Option<char> {
    let c = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "exclamdown" => '\u{00A1}',
        "cent" => '\u{00A2}',
        "sterling" => '\u{00A3}',
        "currency" => '\u{00A4}',
        "yen" => '\u{00A5}',
        "brokenbar" => '\u{00A6}',
        "section" => '\u{00A7}',
        "dieresis" => '\u{00A8}',
        "copyright" => '\u{00A9}',
        "ordfeminine" => '\u{00AA}',
        "guillemotleft" => '\u{00AB}',
        "logicalnot" => '\u{00AC}',
        "registered" => '\u{00AE}',
        "macron" => '\u{00AF}',
        "degree" => '\u{00B0}',
        "plusminus" => '\u{00B1}',
        "acute" => '\u{00B4}',
        "mu" => '\u{00B5}',
        "paragraph" => '\u{00B6}',
        "periodcentered" => '\u{00B7}',
        "cedilla" => '\u{00B8}',
        "ordmasculine" => '\u{00BA}',
        "guillemotright" => '\u{00BB}',
        "onequarter" => '\u{00BC}',
        "onehalf" => '\u{00BD}',
        "threequarters" => '\u{00BE}',
        "questiondown" => '\u{00BF}',
        "Agrave" => '\u{00C0}',
        "Aacute" => '\u{00C1}',
        "Acircumflex" => '\u{00C2}',
        "Atilde" => '\u{00C3}',
        "Adieresis" => '\u{00C4}',
        "Aring" => '\u{00C5}',
        "AE" => '\u{00C6}',
        "Ccedilla" => '\u{00C7}',
        "Egrave" => '\u{00C8}',
        "Eacute" => '\u{00C9}',
        "Ecircumflex" => '\u{00CA}',
        "Edieresis" => '\u{00CB}',
        "Igrave" => '\u{00CC}',
        "Iacute" => '\u{00CD}',
        "Icircumflex" => '\u{00CE}',
        "Idieresis" => '\u{00CF}',
        "Eth" => '\u{00D0}',
        "Ntilde" => '\u{00D1}',
        "Ograve" => '\u{00D2}',
        "Oacute" => '\u{00D3}',
        "Ocircumflex" => '\u{00D4}',
        "Otilde" => '\u{00D5}',
        "Odieresis" => '\u{00D6}',
        "multiply" => '\u{00D7}',
        "Oslash" => '\u{00D8}',
        "Ugrave" => '\u{00D9}',
        "Uacute" => '\u{00DA}',
        "Ucircumflex" => '\u{00DB}',
        "Udieresis" => '\u{00DC}',
        "Yacute" => '\u{00DD}',
        "Thorn" => '\u{00DE}',
        "germandbls" => '\u{00DF}',
        "agrave" => '\u{00E0}',
        "aacute" => '\u{00E1}',
        "acircumflex" => '\u{00E2}',
        "atilde" => '\u{00E3}',
        "adieresis" => '\u{00E4}',
        "aring" => '\u{00E5}',
        "ae" => '\u{00E6}',
        "ccedilla" => '\u{00E7}',
        "egrave" => '\u{00E8}',
        "eacute" => '\u{00E9}',
        "ecircumflex" => '\u{00EA}',
        "edieresis" => '\u{00EB}',
        "igrave" => '\u{00EC}',
        "iacute" => '\u{00ED}',
        "icircumflex" => '\u{00EE}',
        "idieresis" => '\u{00EF}',
        "eth" => '\u{00F0}',
        "ntilde" => '\u{00F1}',
        "ograve" => '\u{00F2}',
        "oacute" => '\u{00F3}',
        "ocircumflex" => '\u{00F4}',
        "otilde" => '\u{00F5}',
        "odieresis" => '\u{00F6}',
        "divide" => '\u{00F7}',
        "oslash" => '\u{00F8}',
        "ugrave" => '\u{00F9}',
        "uacute" => '\u{00FA}',
        "ucircumflex" => '\u{00FB}',
        "udieresis" => '\u{00FC}',
        "yacute" => '\u{00FD}',
        "thorn" => '\u{00FE}',
        "ydieresis" => '\u{00FF}',
        "Amacron" => '\u{0100}',
        "amacron" => '\u{0101}',
        "Lslash" => '\u{0141}',
        "lslash" => '\u{0142}',
        "OE" => '\u{0152}',
        "oe" => '\u{0153}',
        "Scaron" => '\u{0160}',
        "scaron" => '\u{0161}',
        "Ydieresis" => '\u{0178}',
        "Zcaron" => '\u{017D}',
        "zcaron" => '\u{017E}',
        "florin" => '\u{0192}',
        "circumflex" => '\u{02C6}',
        "caron" => '\u{02C7}',
        "breve" => '\u{02D8}',
        "dotaccent" => '\u{02D9}',
        "ring" => '\u{02DA}',
        "ogonek" => '\u{02DB}',
        "tilde" => '\u{02DC}',
        "hungarumlaut" => '\u{02DD}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotesinglbase" => '\u{201A}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotedblbase" => '\u{201E}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "perthousand" => '\u{2030}',
        "guilsinglleft" => '\u{2039}',
        "guilsinglright" => '\u{203A}',
        "fraction" => '\u{2044}',
        "Euro" => '\u{20AC}',
        "trademark" => '\u{2122}',
        "partialdiff" => '\u{2202}',
        "Delta" => '\u{2206}',
        "summation" => '\u{2211}',
        "minus" => '\u{2212}',
        "radical" => '\u{221A}',
        "infinity" => '\u{221E}',
        "integral" => '\u{222B}',
        "approxequal" => '\u{2248}',
        "notequal" => '\u{2260}',
        "lessequal" => '\u{2264}',
        "greaterequal" => '\u{2265}',
        "lozenge" => '\u{25CA}',
        "apple" => '\u{F8FF}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        _ => return None,
    };
    Some(c)
}
