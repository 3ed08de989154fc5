//! Byte-fidelity invariants of the rewriter
//!
//! The rewriter's contract: operations it does not touch come through
//! byte-for-byte and in order; operations it does touch leave the remaining
//! text visually fixed. These tests pin both properties, plus the operand
//! encoding round-trips the contract depends on.

use font_codec::FontRegistry;
use lopdf::{dictionary, Dictionary, Document, Object};
use pdf_geometry::{PageGeometry, Rect};
use pdf_redactor::tokenizer::{ContentLexer, TokenKind};
use pdf_redactor::{
    encode_hex_string, encode_literal_string, redact_content_stream, Letter, RedactionConfig,
};
use proptest::prelude::*;

fn simple_resources() -> Dictionary {
    dictionary! {
        "Font" => Object::Dictionary(dictionary! {
            "F1" => Object::Dictionary(dictionary! {
                "Type" => Object::Name(b"Font".to_vec()),
                "Subtype" => Object::Name(b"Type1".to_vec()),
                "BaseFont" => Object::Name(b"TestSans".to_vec()),
                "FirstChar" => Object::Integer(32),
                "Widths" => Object::Array((0..95).map(|_| Object::Integer(500)).collect()),
                "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
            }),
        }),
    }
}

fn simple_fonts() -> FontRegistry {
    let doc = Document::with_version("1.7");
    let (fonts, _) = FontRegistry::from_resources(&doc, &simple_resources());
    fonts
}

fn letters_for(text: &str, x: f64, y: f64, width: f64) -> Vec<Letter> {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            Letter::new(
                c.to_string(),
                Rect::new(
                    x + i as f64 * width,
                    y - 2.5,
                    x + (i + 1) as f64 * width,
                    y + 7.5,
                ),
            )
        })
        .collect()
}

fn no_marker_config() -> RedactionConfig {
    RedactionConfig {
        draw_visual_marker: false,
        ..RedactionConfig::default()
    }
}

#[test]
fn non_text_operations_survive_byte_exact_and_in_order() {
    let fonts = simple_fonts();
    let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
    let content = b"0.25 0.5 0.75 rg\n10 20 m\n30 40 l\nS\nq\n2 0 0 2 0 0 cm\nBT /F1 10 Tf (Hi) Tj ET\nQ\n1 1 100 100 re\nf";
    let letters = letters_for("Hi", 0.0, 0.0, 10.0);
    // Remove everything shown
    let areas = [Rect::new(-1.0, -10.0, 50.0, 30.0)];

    let outcome = redact_content_stream(
        content,
        &fonts,
        &letters,
        &areas,
        &geometry,
        &no_marker_config(),
        &|| false,
    )
    .unwrap();
    let text = String::from_utf8(outcome.bytes).unwrap();

    // Every non-show operation's exact bytes, in source order
    let expected = [
        "0.25 0.5 0.75 rg",
        "10 20 m",
        "30 40 l",
        "S",
        "q",
        "2 0 0 2 0 0 cm",
        "BT",
        "/F1 10 Tf",
        "ET",
        "Q",
        "1 1 100 100 re",
        "f",
    ];
    let mut cursor = 0;
    for fragment in expected {
        let found = text[cursor..]
            .find(fragment)
            .unwrap_or_else(|| panic!("missing {:?} after offset {} in {}", fragment, cursor, text));
        cursor += found + fragment.len();
    }
    // And the shown text is gone
    assert!(!text.contains("(Hi)"));
}

#[test]
fn untouched_show_operations_survive_byte_exact() {
    let fonts = simple_fonts();
    let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
    // Two lines; only the first is redacted
    let content = b"BT /F1 10 Tf 0 100 Td (Top) Tj 0 -50 Td (Bottom) Tj ET";
    let mut letters = letters_for("Top", 0.0, 100.0, 5.0);
    letters.extend(letters_for("Bottom", 0.0, 50.0, 5.0));
    let areas = [Rect::new(-1.0, 95.0, 20.0, 110.0)];

    let outcome = redact_content_stream(
        content,
        &fonts,
        &letters,
        &areas,
        &geometry,
        &no_marker_config(),
        &|| false,
    )
    .unwrap();
    let text = String::from_utf8(outcome.bytes).unwrap();
    assert!(!text.contains("(Top)"));
    assert!(text.contains("(Bottom) Tj"));
}

#[test]
fn removed_leading_show_reanchors_following_show() {
    let fonts = simple_fonts();
    let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
    // Two shows sharing one pen: removing (AB) must not shift (CD)
    let content = b"BT /F1 10 Tf (AB) Tj (CD) Tj ET";
    let letters = letters_for("ABCD", 0.0, 0.0, 5.0);
    let areas = [Rect::new(-1.0, -5.0, 9.9, 15.0)];

    let outcome = redact_content_stream(
        content,
        &fonts,
        &letters,
        &areas,
        &geometry,
        &no_marker_config(),
        &|| false,
    )
    .unwrap();
    let text = String::from_utf8(outcome.bytes).unwrap();
    assert!(!text.contains("(AB)"));
    // Corrective Tm restores the pen to 10pt before the untouched show
    assert!(text.contains("1 0 0 1 10 0 Tm"), "got: {}", text);
    assert!(text.contains("(CD) Tj"));
}

#[test]
fn emptied_text_object_keeps_its_frame() {
    let fonts = simple_fonts();
    let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
    let content = b"BT /F1 10 Tf (Gone) Tj ET\nBT /F1 10 Tf 0 -100 Td (Kept) Tj ET";
    let mut letters = letters_for("Gone", 0.0, 0.0, 5.0);
    letters.extend(letters_for("Kept", 0.0, -100.0, 5.0));
    let areas = [Rect::new(-1.0, -5.0, 21.0, 15.0)];

    let outcome = redact_content_stream(
        content,
        &fonts,
        &letters,
        &areas,
        &geometry,
        &no_marker_config(),
        &|| false,
    )
    .unwrap();
    let text = String::from_utf8(outcome.bytes).unwrap();
    assert_eq!(text.matches("BT").count(), 2, "got: {}", text);
    assert_eq!(text.matches("ET").count(), 2);
    assert!(!text.contains("(Gone)"));
    assert!(text.contains("(Kept) Tj"));
}

#[test]
fn next_line_show_demotes_but_keeps_line_advance() {
    let fonts = simple_fonts();
    let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
    // Three ' shows; the middle one is fully redacted. The third line must
    // still land two leadings below the first.
    let content = b"BT /F1 10 Tf 14 TL 0 100 Td (One) Tj (Two) ' (Six) ' ET";
    let mut letters = letters_for("One", 0.0, 100.0, 5.0);
    letters.extend(letters_for("Two", 0.0, 86.0, 5.0));
    letters.extend(letters_for("Six", 0.0, 72.0, 5.0));
    let areas = [Rect::new(-1.0, 83.0, 16.0, 94.0)];

    let outcome = redact_content_stream(
        content,
        &fonts,
        &letters,
        &areas,
        &geometry,
        &no_marker_config(),
        &|| false,
    )
    .unwrap();
    let text = String::from_utf8(outcome.bytes).unwrap();
    assert!(!text.contains("(Two)"));
    // The removed ' still advances the line so the next ' lands right
    assert!(text.contains("T*"), "got: {}", text);
    assert!(text.contains("(Six) '"), "got: {}", text);
}

// ============================================================================
// Operand encoding round-trips
// ============================================================================

fn lex_single_string(data: &[u8]) -> Vec<u8> {
    let mut lexer = ContentLexer::new(data);
    match lexer.next_token().unwrap().unwrap().kind {
        TokenKind::LiteralString(bytes) | TokenKind::HexString(bytes) => bytes,
        other => panic!("expected string token, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn literal_string_encoding_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let encoded = encode_literal_string(&bytes);
        prop_assert!(encoded.iter().all(|b| b.is_ascii()));
        prop_assert_eq!(lex_single_string(&encoded), bytes);
    }

    #[test]
    fn hex_string_encoding_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let encoded = encode_hex_string(&bytes);
        prop_assert!(encoded.iter().all(|b| b.is_ascii()));
        prop_assert_eq!(lex_single_string(&encoded), bytes);
    }

    #[test]
    fn rewritten_output_is_ascii_safe(removed_span in 0usize..5) {
        let fonts = simple_fonts();
        let geometry = PageGeometry::new(612.0, 792.0, 0).unwrap();
        let content = b"BT /F1 10 Tf (Hello) Tj ET";
        let letters = letters_for("Hello", 0.0, 0.0, 5.0);
        let left = removed_span as f64 * 5.0;
        let areas = [Rect::new(left + 0.5, -5.0, left + 4.5, 15.0)];
        let outcome = redact_content_stream(
            content, &fonts, &letters, &areas, &geometry, &no_marker_config(), &|| false,
        ).unwrap();
        prop_assert!(outcome.bytes.iter().all(|b| b.is_ascii()));
        prop_assert_eq!(outcome.glyphs_removed, 1);
    }
}
