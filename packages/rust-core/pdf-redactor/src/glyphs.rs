//! Glyph decoder
//!
//! Expands a show operation's operand pieces into the ordered glyph sequence,
//! walking the text matrix glyph by glyph so every glyph gets a bounding box
//! in content-stream coordinates.
//!
//! Width of one glyph in text space:
//!
//! ```text
//! (fontWidth(code)/1000 * fontSize + charSpacing + wordSpacingIfSpace)
//!     * horizontalScaling/100
//! ```
//!
//! `TJ` numbers displace the pen by `-n/1000 * fontSize * scaling` and attach
//! to the preceding glyph as its trailing adjust; they produce no glyph.

use crate::operation::{Glyph, OperandPiece, TextSnapshot};
use font_codec::Font;
use pdf_geometry::{Matrix, Rect};

/// Result of expanding one show operation
pub struct DecodedShow {
    pub glyphs: Vec<Glyph>,
    /// Sum of adjusts seen before the first glyph, in thousandths
    pub leading_adjust: f64,
    /// Text matrix after all pieces were consumed
    pub end_text_matrix: Matrix,
    /// Union of glyph boxes in content-stream coordinates
    pub bbox: Option<Rect>,
}

/// Expand operand pieces under the given state and font
///
/// A `None` font (unresolvable `Tf` target) yields an empty glyph sequence;
/// the pen still advances for `TJ` adjusts so downstream matrices stay
/// consistent.
pub fn decode_show(pieces: &[OperandPiece], state: &TextSnapshot, font: Option<&Font>) -> DecodedShow {
    let mut tm = state.text_matrix;
    let mut glyphs: Vec<Glyph> = Vec::new();
    let mut bbox: Option<Rect> = None;
    let mut leading_adjust = 0.0;
    let scale = state.horizontal_scaling / 100.0;
    let vertical = font.map(|f| f.writing_mode() == 1).unwrap_or(false);

    for (piece_index, piece) in pieces.iter().enumerate() {
        match piece {
            OperandPiece::Adjust(n) => {
                let shift = -n / 1000.0 * state.font_size * scale;
                tm = displacement(shift, vertical).multiply(&tm);
                match glyphs.last_mut() {
                    Some(last) => *last.trailing_adjust.get_or_insert(0.0) += n,
                    None => leading_adjust += n,
                }
            }
            OperandPiece::Text { bytes, hex } => {
                let Some(font) = font else { continue };
                let mut byte_offset = 0usize;
                for code in font.decode_bytes(bytes) {
                    let is_single_byte_space = code.bytes.len() == 1 && code.bytes[0] == b' ';
                    let advance = (code.width / 1000.0 * state.font_size
                        + state.char_spacing
                        + if is_single_byte_space {
                            state.word_spacing
                        } else {
                            0.0
                        })
                        * scale;

                    let glyph_box = glyph_bbox(&tm, state, font, advance);
                    bbox = Some(match bbox {
                        Some(b) => b.union(&glyph_box),
                        None => glyph_box,
                    });

                    let consumed = code.bytes.len();
                    glyphs.push(Glyph {
                        bytes: code.bytes,
                        cid: code.cid,
                        unicode: code.unicode,
                        piece_index,
                        byte_offset,
                        from_hex: *hex,
                        advance,
                        bbox: glyph_box,
                        trailing_adjust: None,
                    });
                    byte_offset += consumed;
                    tm = displacement(advance, vertical).multiply(&tm);
                }
            }
        }
    }

    DecodedShow {
        glyphs,
        leading_adjust,
        end_text_matrix: tm,
        bbox,
    }
}

fn displacement(amount: f64, vertical: bool) -> Matrix {
    if vertical {
        Matrix::translation(0.0, -amount)
    } else {
        Matrix::translation(amount, 0.0)
    }
}

/// Bounding box of the glyph at the current pen position, in content-stream
/// coordinates
fn glyph_bbox(tm: &Matrix, state: &TextSnapshot, font: &Font, advance: f64) -> Rect {
    let size = state.font_size;
    let ascent = font.ascent() / 1000.0 * size + state.rise;
    let descent = font.descent() / 1000.0 * size + state.rise;
    let text_space = Rect::from_corners(0.0, descent, advance, ascent);
    let to_content = tm.multiply(&state.ctm);
    to_content.transform_rect(&text_space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_codec::FontRegistry;
    use lopdf::{dictionary, Dictionary, Document, Object};

    /// Resources with one Type1 font: every code 32..=95 is 500 units wide
    fn test_resources() -> Dictionary {
        dictionary! {
            "Font" => Object::Dictionary(dictionary! {
                "F1" => Object::Dictionary(dictionary! {
                    "Type" => Object::Name(b"Font".to_vec()),
                    "Subtype" => Object::Name(b"Type1".to_vec()),
                    "BaseFont" => Object::Name(b"TestSans".to_vec()),
                    "FirstChar" => Object::Integer(32),
                    "Widths" => Object::Array((0..64).map(|_| Object::Integer(500)).collect()),
                    "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
                }),
            }),
        }
    }

    fn state_at(size: f64) -> TextSnapshot {
        TextSnapshot {
            font_name: Some("F1".to_string()),
            font_size: size,
            ..TextSnapshot::default()
        }
    }

    #[test]
    fn test_glyph_advances_are_cumulative() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let pieces = vec![OperandPiece::Text {
            bytes: b"AB".to_vec(),
            hex: false,
        }];
        let decoded = decode_show(&pieces, &state_at(10.0), Some(font));
        assert_eq!(decoded.glyphs.len(), 2);
        // 500/1000 * 10 = 5 points per glyph
        assert!((decoded.glyphs[0].advance - 5.0).abs() < 1e-9);
        assert!((decoded.glyphs[0].bbox.left - 0.0).abs() < 1e-9);
        assert!((decoded.glyphs[1].bbox.left - 5.0).abs() < 1e-9);
        assert!((decoded.end_text_matrix.e - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_char_and_word_spacing() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let mut state = state_at(10.0);
        state.char_spacing = 1.0;
        state.word_spacing = 2.0;
        let pieces = vec![OperandPiece::Text {
            bytes: b"A B".to_vec(),
            hex: false,
        }];
        let decoded = decode_show(&pieces, &state, Some(font));
        // 'A': 5 + 1; ' ': 5 + 1 + 2; 'B': 5 + 1
        assert!((decoded.glyphs[0].advance - 6.0).abs() < 1e-9);
        assert!((decoded.glyphs[1].advance - 8.0).abs() < 1e-9);
        assert!((decoded.glyphs[2].advance - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_scaling_applies_to_advance() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let mut state = state_at(10.0);
        state.horizontal_scaling = 50.0;
        let pieces = vec![OperandPiece::Text {
            bytes: b"A".to_vec(),
            hex: false,
        }];
        let decoded = decode_show(&pieces, &state, Some(font));
        assert!((decoded.glyphs[0].advance - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_tj_adjust_attaches_to_preceding_glyph() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let pieces = vec![
            OperandPiece::Text {
                bytes: b"A".to_vec(),
                hex: false,
            },
            OperandPiece::Adjust(-120.0),
            OperandPiece::Text {
                bytes: b"B".to_vec(),
                hex: false,
            },
        ];
        let decoded = decode_show(&pieces, &state_at(10.0), Some(font));
        assert_eq!(decoded.glyphs[0].trailing_adjust, Some(-120.0));
        assert_eq!(decoded.glyphs[1].trailing_adjust, None);
        // B starts at 5 (A) + 1.2 (kern: 120/1000 * 10)
        assert!((decoded.glyphs[1].bbox.left - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_consecutive_adjusts_accumulate() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let pieces = vec![
            OperandPiece::Text {
                bytes: b"A".to_vec(),
                hex: false,
            },
            OperandPiece::Adjust(-100.0),
            OperandPiece::Adjust(-20.0),
        ];
        let decoded = decode_show(&pieces, &state_at(10.0), Some(font));
        assert_eq!(decoded.glyphs[0].trailing_adjust, Some(-120.0));
    }

    #[test]
    fn test_bbox_through_text_matrix_and_ctm() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let mut state = state_at(10.0);
        state.text_matrix = Matrix::translation(100.0, 700.0);
        state.ctm = Matrix::scale(2.0, 1.0);
        let pieces = vec![OperandPiece::Text {
            bytes: b"A".to_vec(),
            hex: false,
        }];
        let decoded = decode_show(&pieces, &state, Some(font));
        let bbox = decoded.glyphs[0].bbox;
        assert!((bbox.left - 200.0).abs() < 1e-9);
        assert!((bbox.right - 210.0).abs() < 1e-9);
        // Default descent -250/1000 * 10 below the 700 baseline
        assert!((bbox.bottom - 697.5).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_without_font_still_moves_pen() {
        let pieces = vec![OperandPiece::Adjust(-500.0)];
        let decoded = decode_show(&pieces, &state_at(10.0), None);
        assert!(decoded.glyphs.is_empty());
        // -(-500)/1000 * 10 = +5
        assert!((decoded.end_text_matrix.e - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_font_yields_no_glyphs() {
        let pieces = vec![OperandPiece::Text {
            bytes: b"Hello".to_vec(),
            hex: false,
        }];
        let decoded = decode_show(&pieces, &state_at(12.0), None);
        assert!(decoded.glyphs.is_empty());
        assert!(decoded.bbox.is_none());
    }

    #[test]
    fn test_piece_and_byte_indices() {
        let doc = Document::with_version("1.7");
        let (registry, _) = FontRegistry::from_resources(&doc, &test_resources());
        let font = registry.get("F1").unwrap();

        let pieces = vec![
            OperandPiece::Text {
                bytes: b"AB".to_vec(),
                hex: false,
            },
            OperandPiece::Adjust(50.0),
            OperandPiece::Text {
                bytes: b"C".to_vec(),
                hex: true,
            },
        ];
        let decoded = decode_show(&pieces, &state_at(10.0), Some(font));
        assert_eq!(decoded.glyphs[0].piece_index, 0);
        assert_eq!(decoded.glyphs[0].byte_offset, 0);
        assert_eq!(decoded.glyphs[1].byte_offset, 1);
        assert_eq!(decoded.glyphs[2].piece_index, 2);
        assert!(decoded.glyphs[2].from_hex);
        assert!(!decoded.glyphs[0].from_hex);
    }
}
