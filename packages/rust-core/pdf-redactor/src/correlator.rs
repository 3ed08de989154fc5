//! Glyph correlator
//!
//! Matches the extractor's letters against decoded glyphs and decides which
//! glyphs fall inside the redaction areas. Both sequences are ordered by
//! stream position, so a streaming two-pointer alignment with a short
//! look-ahead suffices; Unicode differences are bridged by NFKC + alias
//! normalization, and ligatures are handled by letting one glyph consume
//! several letters (and vice versa).
//!
//! When alignment diverges inside an operation the operation is skipped as a
//! unit: a warning is recorded and, if the operation overlaps a redaction
//! area, every glyph in it is marked (whole-operation removal). This applies
//! regardless of the configured strategy.

use crate::config::GlyphRemovalStrategy;
use crate::error::RedactWarning;
use crate::letters::Letter;
use crate::operation::{OpKind, Operation, ShowTextOp};
use crate::unicode::normalize_for_match;
use font_codec::{FontKind, FontRegistry, REPLACEMENT};
use pdf_geometry::Rect;
use std::collections::{HashMap, HashSet};

/// Bounding boxes are inflated by this much before the candidate test, so
/// glyphs on an area's edge are still considered
const CANDIDATE_TOLERANCE: f64 = 2.0;

/// How far the aligner searches past a mismatch before declaring divergence
const LOOKAHEAD: usize = 4;

/// Most letters one glyph may consume (ligature expansion) and vice versa
const CLUSTER_LIMIT: usize = 4;

/// The set of glyphs to remove, plus per-operation metadata for emission
#[derive(Debug, Clone, Default)]
pub struct RemovalPlan {
    /// Operation index → per-glyph removal mask
    masks: HashMap<usize, Vec<bool>>,
    /// Operations removed as a unit after an alignment failure
    whole_operations: HashSet<usize>,
}

impl RemovalPlan {
    /// Whether nothing is marked
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// The removal mask for an operation, if any glyph is marked
    pub fn mask(&self, operation: usize) -> Option<&[bool]> {
        self.masks.get(&operation).map(|m| m.as_slice())
    }

    /// Whether the operation was removed as a unit
    pub fn is_whole_operation(&self, operation: usize) -> bool {
        self.whole_operations.contains(&operation)
    }

    /// Total glyphs marked for removal
    pub fn glyphs_marked(&self) -> usize {
        self.masks
            .values()
            .map(|m| m.iter().filter(|&&r| r).count())
            .sum()
    }

    fn mark(&mut self, operation: usize, glyph_count: usize, glyph: usize) {
        let mask = self
            .masks
            .entry(operation)
            .or_insert_with(|| vec![false; glyph_count]);
        mask[glyph] = true;
    }

    fn mark_all(&mut self, operation: usize, glyph_count: usize) {
        self.masks.insert(operation, vec![true; glyph_count]);
        self.whole_operations.insert(operation);
    }

    fn unmark(&mut self, operation: usize) {
        self.masks.remove(&operation);
        self.whole_operations.remove(&operation);
    }
}

/// Whether a glyph box falls to the active strategy
fn glyph_hit(bbox: &Rect, areas: &[Rect], strategy: GlyphRemovalStrategy) -> bool {
    match strategy {
        GlyphRemovalStrategy::CenterPoint => areas.iter().any(|a| {
            let c = bbox.center();
            a.contains_point(c.x, c.y)
        }),
        GlyphRemovalStrategy::AnyOverlap => areas.iter().any(|a| a.intersects(bbox)),
        GlyphRemovalStrategy::FullyContained => areas.iter().any(|a| a.contains_rect(bbox)),
    }
}

fn is_candidate(show: &ShowTextOp, areas: &[Rect]) -> bool {
    match &show.bbox {
        Some(bbox) => {
            let inflated = bbox.inflate(CANDIDATE_TOLERANCE);
            areas.iter().any(|a| inflated.intersects(a))
        }
        None => false,
    }
}

/// Correlate letters with glyphs and build the removal plan
///
/// `areas` must already be in content-stream space (the caller applies the
/// rotation transform); `letters` stay in visual space, but only their
/// ordering and Unicode participate here. Geometry decisions run on glyph
/// boxes, which the decoder computed in content-stream space.
pub fn correlate(
    operations: &[Operation],
    letters: &[Letter],
    areas: &[Rect],
    fonts: &FontRegistry,
    strategy: GlyphRemovalStrategy,
    warnings: &mut Vec<RedactWarning>,
) -> RemovalPlan {
    let mut plan = RemovalPlan::default();
    if areas.is_empty() {
        return plan;
    }

    // Inline images cannot be partially redacted; flag overlapping ones
    for op in operations {
        if let OpKind::InlineImage { bbox: Some(bbox) } = &op.kind {
            if areas.iter().any(|a| a.intersects(bbox)) {
                warnings.push(RedactWarning::UnsupportedFeature {
                    what: "inline image overlapping a redaction area".to_string(),
                });
            }
        }
    }

    let normalized_letters: Vec<String> = letters
        .iter()
        .map(|l| normalize_for_match(&l.unicode))
        .collect();

    let mut cursor = LetterCursor::new(&normalized_letters);
    let mut seeded = false;

    for op in operations {
        let Some(show) = op.as_show() else { continue };
        if show.glyphs.is_empty() {
            continue; // unresolved font: never selected for removal
        }
        let candidate = is_candidate(show, areas);

        // Type 3 shows are never rewritten; report only when an area wants
        // glyphs out of one
        if candidate && is_type3(show, fonts) {
            warnings.push(RedactWarning::UnsupportedFeature {
                what: format!(
                    "Type 3 font {} under a redaction area",
                    show.state.font_name.as_deref().unwrap_or("?")
                ),
            });
            cursor.skip_for(show);
            continue;
        }

        if !seeded {
            cursor.seed(show);
            seeded = true;
        }

        let aligned = cursor.align(show, |glyph_index, _letter_index| {
            if candidate && glyph_hit(&show.glyphs[glyph_index].bbox, areas, strategy) {
                plan.mark(op.index, show.glyphs.len(), glyph_index);
            }
        });

        if !aligned {
            if candidate {
                warnings.push(RedactWarning::AlignmentFailure {
                    operation: op.index,
                });
                if overlaps_any(show, areas) {
                    plan.mark_all(op.index, show.glyphs.len());
                } else {
                    plan.unmark(op.index);
                }
            } else {
                plan.unmark(op.index);
            }
        }

        // Removals inside an ActualText range would leave the replacement
        // text in place; preserve the operation instead
        if show.in_actual_text && plan.mask(op.index).is_some() {
            plan.unmark(op.index);
            warnings.push(RedactWarning::UnsupportedFeature {
                what: "redaction inside an ActualText marked-content range".to_string(),
            });
        }
    }

    plan
}

fn is_type3(show: &ShowTextOp, fonts: &FontRegistry) -> bool {
    show.state
        .font_name
        .as_deref()
        .and_then(|name| fonts.get(name))
        .map(|font| font.kind() == FontKind::Type3)
        .unwrap_or(false)
}

fn overlaps_any(show: &ShowTextOp, areas: &[Rect]) -> bool {
    show.glyphs
        .iter()
        .any(|g| areas.iter().any(|a| a.intersects(&g.bbox)))
        || show
            .bbox
            .map(|b| areas.iter().any(|a| a.intersects(&b)))
            .unwrap_or(false)
}

/// Streaming cursor over the normalized letter sequence
struct LetterCursor<'a> {
    letters: &'a [String],
    position: usize,
}

impl<'a> LetterCursor<'a> {
    fn new(letters: &'a [String]) -> Self {
        Self {
            letters,
            position: 0,
        }
    }

    /// Anchor the cursor by locating the stream's opening glyphs in the
    /// letter sequence; needed when this stream is a Form XObject whose
    /// text starts mid-page
    fn seed(&mut self, show: &ShowTextOp) {
        let probe: Vec<String> = show
            .glyphs
            .iter()
            .take(LOOKAHEAD)
            .map(|g| normalize_for_match(&g.unicode))
            .collect();
        if probe.is_empty() || probe.iter().any(|p| p == REPLACEMENT) {
            return;
        }
        let needle: String = probe.concat();
        for start in 0..self.letters.len() {
            let mut built = String::new();
            for letter in &self.letters[start..] {
                built.push_str(letter);
                if built.len() >= needle.len() {
                    break;
                }
            }
            if built.starts_with(&needle) || needle.starts_with(&built) && !built.is_empty() {
                self.position = start;
                return;
            }
        }
    }

    /// Advance past an operation without aligning (skipped operations)
    fn skip_for(&mut self, show: &ShowTextOp) {
        self.position = (self.position + show.glyphs.len()).min(self.letters.len());
    }

    /// Align one operation's glyphs against the letters
    ///
    /// `on_pair(glyph_index, letter_index)` fires for every aligned glyph.
    /// Returns false on divergence; the cursor then resynchronizes by
    /// skipping one letter per unconsumed glyph.
    fn align(
        &mut self,
        show: &ShowTextOp,
        mut on_pair: impl FnMut(usize, usize),
    ) -> bool {
        let glyphs: Vec<String> = show
            .glyphs
            .iter()
            .map(|g| normalize_for_match(&g.unicode))
            .collect();
        let mut gi = 0;

        while gi < glyphs.len() {
            if self.position >= self.letters.len() {
                self.resync(glyphs.len() - gi);
                return false;
            }
            if let Some((glyph_used, letters_used)) = self.try_pair(&glyphs, gi) {
                for offset in 0..glyph_used {
                    on_pair(gi + offset, self.position);
                }
                gi += glyph_used;
                self.position += letters_used;
                continue;
            }
            // Look ahead: skip unmatched glyphs (extractor dropped them) or
            // unmatched letters (stream draws them out of order)
            let skipped_glyph = (1..=LOOKAHEAD)
                .find(|&k| gi + k < glyphs.len() && self.try_pair(&glyphs, gi + k).is_some());
            if let Some(k) = skipped_glyph {
                gi += k;
                continue;
            }
            let saved = self.position;
            let skipped_letter = (1..=LOOKAHEAD).find(|&k| {
                self.position = saved + k;
                self.position < self.letters.len() && self.try_pair(&glyphs, gi).is_some()
            });
            match skipped_letter {
                Some(k) => {
                    self.position = saved + k;
                }
                None => {
                    self.position = saved;
                    self.resync(glyphs.len() - gi);
                    return false;
                }
            }
        }
        true
    }

    /// Try to pair glyphs starting at `gi` with letters at the cursor.
    /// Returns `(glyphs consumed, letters consumed)`.
    fn try_pair(&self, glyphs: &[String], gi: usize) -> Option<(usize, usize)> {
        let glyph = &glyphs[gi];
        let letter = &self.letters[self.position];

        // Unresolvable Unicode matches any single letter; geometry still
        // decides removal
        if glyph == REPLACEMENT {
            return Some((1, 1));
        }
        if glyph == letter {
            return Some((1, 1));
        }
        // One glyph covering several letters (extractor split a ligature)
        if glyph.starts_with(letter.as_str()) {
            let mut built = letter.clone();
            for extra in 1..CLUSTER_LIMIT {
                let next = self.letters.get(self.position + extra)?;
                built.push_str(next);
                if &built == glyph {
                    return Some((1, extra + 1));
                }
                if !glyph.starts_with(&built) {
                    break;
                }
            }
            return None;
        }
        // One letter covering several glyphs (extractor merged marks)
        if letter.starts_with(glyph.as_str()) {
            let mut built = glyph.clone();
            for extra in 1..CLUSTER_LIMIT {
                let next = glyphs.get(gi + extra)?;
                built.push_str(next);
                if &built == letter {
                    return Some((extra + 1, 1));
                }
                if !letter.starts_with(&built) {
                    break;
                }
            }
            return None;
        }
        None
    }

    /// Count-based resynchronization after divergence
    fn resync(&mut self, remaining_glyphs: usize) {
        self.position = (self.position + remaining_glyphs).min(self.letters.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::interpret;
    use lopdf::{dictionary, Dictionary, Document, Object};
    use pdf_geometry::Matrix;

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

    /// Letters matching `text` laid out left to right from (x, y), 5 points
    /// per glyph at font size 10
    fn letters_for(text: &str, x: f64, y: f64) -> Vec<Letter> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                Letter::new(
                    c.to_string(),
                    Rect::new(
                        x + i as f64 * 5.0,
                        y - 2.5,
                        x + (i + 1) as f64 * 5.0,
                        y + 7.5,
                    ),
                )
            })
            .collect()
    }

    fn setup(data: &[u8]) -> (Vec<Operation>, FontRegistry) {
        let doc = Document::with_version("1.7");
        let (fonts, _) = FontRegistry::from_resources(&doc, &test_resources());
        let mut warnings = Vec::new();
        let ops = interpret(data, &fonts, Matrix::IDENTITY, &mut warnings, &|| false).unwrap();
        (ops, fonts)
    }

    #[test]
    fn test_marks_glyphs_inside_area() {
        // "Hello" at origin, glyphs 5pt wide; area covers the last glyph
        let (ops, fonts) = setup(b"BT /F1 10 Tf (Hello) Tj ET");
        let letters = letters_for("Hello", 0.0, 0.0);
        let areas = [Rect::new(20.0, -5.0, 25.0, 10.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        let mask = plan.mask(2).expect("show op should be marked");
        assert_eq!(mask, &[false, false, false, false, true]);
        assert_eq!(plan.glyphs_marked(), 1);
    }

    #[test]
    fn test_no_areas_no_plan() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (Hello) Tj ET");
        let letters = letters_for("Hello", 0.0, 0.0);
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &[],
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_center_point_spares_edge_overlap() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (AB) Tj ET");
        let letters = letters_for("AB", 0.0, 0.0);
        // Covers only the left fifth of glyph A (center at 2.5)
        let areas = [Rect::new(0.0, -5.0, 1.0, 10.0)];
        let mut warnings = Vec::new();

        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::CenterPoint,
            &mut warnings,
        );
        assert!(plan.is_empty());

        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert_eq!(plan.glyphs_marked(), 1);
    }

    #[test]
    fn test_fully_contained_requires_whole_glyph() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (AB) Tj ET");
        let letters = letters_for("AB", 0.0, 0.0);
        // Covers glyph A fully, glyph B partially
        let areas = [Rect::new(-1.0, -5.0, 7.0, 10.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::FullyContained,
            &mut warnings,
        );
        assert_eq!(plan.mask(2).unwrap(), &[true, false]);
    }

    #[test]
    fn test_alignment_failure_falls_back_to_whole_operation() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (Hello) Tj ET");
        // Letters disagree completely with the decoded glyphs
        let letters = letters_for("XYZQW", 0.0, 0.0);
        let areas = [Rect::new(0.0, -5.0, 10.0, 10.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::CenterPoint,
            &mut warnings,
        );
        assert!(warnings
            .iter()
            .any(|w| matches!(w, RedactWarning::AlignmentFailure { operation: 2 })));
        // Whole-operation removal regardless of the center-point strategy
        assert!(plan.is_whole_operation(2));
        assert_eq!(plan.glyphs_marked(), 5);
    }

    #[test]
    fn test_divergence_outside_areas_is_silent() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (Hello) Tj ET");
        let letters = letters_for("XYZQW", 0.0, 0.0);
        // Area far away from the text
        let areas = [Rect::new(500.0, 500.0, 520.0, 520.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(plan.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_extractor_skipping_spaces_still_aligns() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (A B) Tj ET");
        // Extractor dropped the space: letters are A then B
        let letters = vec![
            Letter::new("A", Rect::new(0.0, -2.5, 5.0, 7.5)),
            Letter::new("B", Rect::new(10.0, -2.5, 15.0, 7.5)),
        ];
        let areas = [Rect::new(10.0, -5.0, 15.0, 10.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        // Only B removed; the unmatched space glyph is left alone
        assert_eq!(plan.mask(2).unwrap(), &[false, false, true]);
    }

    /// Resources with a font whose code 102 maps to the fi ligature
    fn ligature_resources() -> Dictionary {
        dictionary! {
            "Font" => Object::Dictionary(dictionary! {
                "F2" => Object::Dictionary(dictionary! {
                    "Type" => Object::Name(b"Font".to_vec()),
                    "Subtype" => Object::Name(b"Type1".to_vec()),
                    "BaseFont" => Object::Name(b"TestSerif".to_vec()),
                    "FirstChar" => Object::Integer(32),
                    "Widths" => Object::Array((0..64).map(|_| Object::Integer(500)).collect()),
                    "Encoding" => Object::Dictionary(dictionary! {
                        "BaseEncoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
                        "Differences" => Object::Array(vec![
                            Object::Integer(102),
                            Object::Name(b"fi".to_vec()),
                        ]),
                    }),
                }),
            }),
        }
    }

    #[test]
    fn test_one_ligature_glyph_consumes_two_letters() {
        // Code 102 renders the fi ligature (one glyph, Unicode "fi"); the
        // extractor reports f and i as separate letters
        let doc = Document::with_version("1.7");
        let (fonts, _) = FontRegistry::from_resources(&doc, &ligature_resources());
        let mut warnings = Vec::new();
        let ops = interpret(
            b"BT /F2 10 Tf (fx) Tj ET",
            &fonts,
            Matrix::IDENTITY,
            &mut warnings,
            &|| false,
        )
        .unwrap();
        let show = ops[2].as_show().unwrap();
        assert_eq!(show.glyphs.len(), 2);
        assert_eq!(show.glyphs[0].unicode, "\u{FB01}");

        let letters = vec![
            Letter::new("f", Rect::new(0.0, -2.5, 2.5, 7.5)),
            Letter::new("i", Rect::new(2.5, -2.5, 5.0, 7.5)),
            Letter::new("x", Rect::new(5.0, -2.5, 10.0, 7.5)),
        ];
        let areas = [Rect::new(0.0, -5.0, 10.0, 10.0)];
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        // Both glyphs marked: the ligature paired with two letters, x with one
        assert_eq!(plan.glyphs_marked(), 2);
    }

    #[test]
    fn test_quote_normalization_bridges_extractor() {
        let (ops, fonts) = setup(b"BT /F1 10 Tf (it's) Tj ET");
        // Extractor reports a typographic apostrophe
        let mut letters = letters_for("it's", 0.0, 0.0);
        letters[2].unicode = "\u{2019}".to_string();
        let areas = [Rect::new(0.0, -5.0, 20.0, 10.0)];
        let mut warnings = Vec::new();
        let plan = correlate(
            &ops,
            &letters,
            &areas,
            &fonts,
            GlyphRemovalStrategy::AnyOverlap,
            &mut warnings,
        );
        assert!(warnings.is_empty());
        assert_eq!(plan.glyphs_marked(), 4);
    }
}
