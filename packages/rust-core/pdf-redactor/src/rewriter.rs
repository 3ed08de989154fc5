//! Content stream rewriter
//!
//! Emits the output byte stream: untouched operations are copied verbatim
//! from their source ranges; show operations with marked glyphs are replaced
//! by their surviving glyph runs, re-anchored with absolute `Tm` operators so
//! the remaining text renders exactly where it did before.
//!
//! Removing or rewriting a show operation leaves the interpreter-visible
//! text/line matrices different from the original program's. Operations that
//! *read* those matrices and are copied verbatim would then land in the wrong
//! place, so the rewriter tracks a pen-dirty and a line-dirty flag and emits
//! a corrective `Tm` (set to the matrix the original program had at that
//! point) immediately before any copied operation that is sensitive to the
//! stale matrix.

use crate::correlator::RemovalPlan;
use crate::error::RedactError;
use crate::operation::{
    Glyph, OpKind, Operation, PenSensitivity, ShowOperator, ShowTextOp,
};
use pdf_geometry::Matrix;
use std::collections::HashMap;

/// Matrix comparisons run at the visual-stability tolerance
const POSITION_TOLERANCE: f64 = 0.01;

/// Result of rewriting one content stream
pub struct RewriteOutcome {
    pub bytes: Vec<u8>,
    /// Show operations replaced (not counting verbatim copies)
    pub operations_rewritten: usize,
}

/// Rewrite a content stream
///
/// `xobject_renames` maps operation indices of `Do` invocations to fresh
/// resource names (the copy-on-modify path of the recursion driver).
pub fn rewrite_stream(
    source: &[u8],
    operations: &[Operation],
    plan: &RemovalPlan,
    xobject_renames: &HashMap<usize, String>,
) -> Result<RewriteOutcome, RedactError> {
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut rewritten = 0usize;
    // Stale-state flags; only meaningful inside a text object
    let mut pen_dirty = false;
    let mut line_dirty = false;

    for op in operations {
        if let Some(new_name) = xobject_renames.get(&op.index) {
            emit_line(&mut out, format!("/{} Do", new_name).as_bytes());
            continue;
        }
        let mask = plan.mask(op.index);
        match (&op.kind, mask) {
            (OpKind::ShowText(show), Some(mask)) => {
                if mask.len() != show.glyphs.len() {
                    return Err(RedactError::Internal(format!(
                        "removal mask length {} does not match glyph count {}",
                        mask.len(),
                        show.glyphs.len()
                    )));
                }
                let end_state = rewrite_show(&mut out, show, mask, line_dirty)?;
                pen_dirty = end_state.pen_dirty;
                line_dirty = end_state.line_dirty;
                rewritten += 1;
            }
            _ => {
                // Verbatim copy, preceded by a corrective Tm when the
                // operation reads a matrix the rewrite left stale
                match op.pen_sensitivity {
                    PenSensitivity::ReadsPen if pen_dirty => {
                        emit_tm(&mut out, &op.pre_text_matrix);
                        pen_dirty = false;
                        line_dirty = !matrices_close(&op.pre_text_matrix, &op.pre_line_matrix);
                    }
                    PenSensitivity::ReadsLine if line_dirty => {
                        emit_tm(&mut out, &op.pre_line_matrix);
                        line_dirty = false;
                        // The operation overwrites the text matrix from the
                        // now-correct line matrix
                        pen_dirty = false;
                    }
                    PenSensitivity::SetsBoth => {
                        pen_dirty = false;
                        line_dirty = false;
                    }
                    _ => {}
                }
                emit_line(&mut out, &source[op.range.0..op.range.1]);
            }
        }
    }

    Ok(RewriteOutcome {
        bytes: out,
        operations_rewritten: rewritten,
    })
}

struct ShowEndState {
    pen_dirty: bool,
    line_dirty: bool,
}

/// Replace one show operation with its surviving runs
fn rewrite_show(
    out: &mut Vec<u8>,
    show: &ShowTextOp,
    mask: &[bool],
    line_dirty: bool,
) -> Result<ShowEndState, RedactError> {
    let mut anchors_emitted = 0usize;

    // `'` and `"` demote to their side-effect operators plus a plain show,
    // so partial glyph sets never re-trigger the line move or re-show the
    // spacing operands. The snapshot line matrix is the post-move position:
    // with a stale line matrix an absolute `Tm` to that position replaces
    // the `T*` outright.
    match show.operator {
        ShowOperator::NextLineShow => {
            if line_dirty {
                emit_tm(out, &show.state.line_matrix);
            } else {
                emit_line(out, b"T*");
            }
        }
        ShowOperator::SpacingNextLineShow => {
            let (aw, ac) = show.quote_spacing.unwrap_or((0.0, 0.0));
            emit_line(out, format!("{} Tw", fmt_number(aw)).as_bytes());
            emit_line(out, format!("{} Tc", fmt_number(ac)).as_bytes());
            if line_dirty {
                emit_tm(out, &show.state.line_matrix);
            } else {
                emit_line(out, b"T*");
            }
        }
        _ => {}
    }

    // Pen displacement from the show's start to each glyph, adjusts included
    let displacements = cumulative_displacements(show);
    let runs = kept_runs(mask);
    let mut emitted_end = show.state.text_matrix;
    for (run_index, run) in runs.iter().enumerate() {
        let run_start_tm = pen_matrix_at(show, displacements[run.start]);
        let needs_anchor = run_index > 0
            || !matrices_close(&run_start_tm, &show.state.text_matrix);
        if needs_anchor {
            emit_tm(out, &run_start_tm);
            anchors_emitted += 1;
        }
        emit_run(out, show, run.start, run.end)?;
        let end_disp = displacements[run.end - 1]
            + show.glyphs[run.end - 1].advance
            + kept_trailing_shift(show, run.end - 1);
        emitted_end = pen_matrix_at(show, end_disp);
    }

    let pen_dirty = !matrices_close(&emitted_end, &show.end_text_matrix);
    // Any emitted Tm clobbers the line matrix; the `'`/`"` demotion path
    // only stays clean when no anchor was needed
    let line_dirty_after = if anchors_emitted > 0 {
        true
    } else {
        match show.operator {
            ShowOperator::NextLineShow | ShowOperator::SpacingNextLineShow => false,
            _ => line_dirty,
        }
    };

    Ok(ShowEndState {
        pen_dirty,
        line_dirty: line_dirty_after,
    })
}

struct Run {
    start: usize,
    end: usize, // exclusive
}

fn kept_runs(mask: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, removed) in mask.iter().enumerate() {
        match (removed, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(Run { start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(Run {
            start: s,
            end: mask.len(),
        });
    }
    runs
}

/// Displacement of the pen (text space) from the show start to each glyph,
/// starting past any adjusts that precede the first glyph
fn cumulative_displacements(show: &ShowTextOp) -> Vec<f64> {
    let mut displacements = Vec::with_capacity(show.glyphs.len() + 1);
    let mut acc =
        -show.leading_adjust / 1000.0 * show.state.font_size * show.state.horizontal_scaling
            / 100.0;
    for glyph in &show.glyphs {
        displacements.push(acc);
        acc += glyph.advance + trailing_shift(show, glyph);
    }
    displacements.push(acc);
    displacements
}

fn trailing_shift(show: &ShowTextOp, glyph: &Glyph) -> f64 {
    glyph
        .trailing_adjust
        .map(|n| -n / 1000.0 * show.state.font_size * show.state.horizontal_scaling / 100.0)
        .unwrap_or(0.0)
}

/// Trailing shift of a glyph, counted only when its adjust survives (the
/// glyph is kept, so its adjust is re-emitted)
fn kept_trailing_shift(show: &ShowTextOp, glyph_index: usize) -> f64 {
    trailing_shift(show, &show.glyphs[glyph_index])
}

fn pen_matrix_at(show: &ShowTextOp, displacement: f64) -> Matrix {
    Matrix::translation(displacement, 0.0).multiply(&show.state.text_matrix)
}

/// Emit one kept run in the source operator's variant
fn emit_run(
    out: &mut Vec<u8>,
    show: &ShowTextOp,
    start: usize,
    end: usize,
) -> Result<(), RedactError> {
    let glyphs = &show.glyphs[start..end];
    // Hex when any source glyph was hex or uses multi-byte codes
    let hex = glyphs.iter().any(|g| g.from_hex || g.bytes.len() > 1);

    match show.operator {
        ShowOperator::ShowAdjusted => {
            out.push(b'[');
            let mut piece_bytes: Vec<u8> = Vec::new();
            let mut current_piece = glyphs[0].piece_index;
            for (i, glyph) in glyphs.iter().enumerate() {
                if glyph.piece_index != current_piece {
                    write_string(out, &piece_bytes, hex);
                    piece_bytes.clear();
                    current_piece = glyph.piece_index;
                }
                piece_bytes.extend_from_slice(&glyph.bytes);
                // A kept glyph's adjust is preserved; it closes the current
                // string inside the array
                let is_last = i + 1 == glyphs.len();
                if let Some(adjust) = glyph.trailing_adjust {
                    write_string(out, &piece_bytes, hex);
                    piece_bytes.clear();
                    out.extend_from_slice(fmt_number(adjust).as_bytes());
                    if !is_last {
                        out.push(b' ');
                    }
                    if !is_last {
                        current_piece = glyphs[i + 1].piece_index;
                    }
                }
            }
            if !piece_bytes.is_empty() {
                write_string(out, &piece_bytes, hex);
            }
            emit_line(out, b"] TJ");
        }
        _ => {
            // Tj, and the demoted tail of ' / "
            let bytes: Vec<u8> = glyphs.iter().flat_map(|g| g.bytes.clone()).collect();
            write_string(out, &bytes, hex);
            emit_line(out, b" Tj");
        }
    }
    Ok(())
}

// ============================================================================
// Low-level emission
// ============================================================================

fn emit_line(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes);
    out.push(b'\n');
}

fn emit_tm(out: &mut Vec<u8>, m: &Matrix) {
    emit_line(
        out,
        format!(
            "{} {} {} {} {} {} Tm",
            fmt_number(m.a),
            fmt_number(m.b),
            fmt_number(m.c),
            fmt_number(m.d),
            fmt_number(m.e),
            fmt_number(m.f)
        )
        .as_bytes(),
    );
}

fn matrices_close(a: &Matrix, b: &Matrix) -> bool {
    (a.a - b.a).abs() < POSITION_TOLERANCE
        && (a.b - b.b).abs() < POSITION_TOLERANCE
        && (a.c - b.c).abs() < POSITION_TOLERANCE
        && (a.d - b.d).abs() < POSITION_TOLERANCE
        && (a.e - b.e).abs() < POSITION_TOLERANCE
        && (a.f - b.f).abs() < POSITION_TOLERANCE
}

/// Format a number the way content streams write them: shortest decimal
/// form, no exponent, no trailing zeros
pub fn fmt_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let mut s = format!("{:.4}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

/// Encode bytes as a literal string operand, delimiters included
///
/// Parentheses, backslashes and non-printable bytes are escaped; everything
/// else passes through so the output stays ASCII-safe.
pub fn encode_literal_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            b if b < 0x20 || b >= 0x7F => {
                out.extend_from_slice(format!("\\{:03o}", b).as_bytes())
            }
            b => out.push(b),
        }
    }
    out.push(b')');
    out
}

/// Encode bytes as a hex string operand: uppercase digits, no whitespace
pub fn encode_hex_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2 + 2);
    out.push(b'<');
    for b in bytes {
        out.extend_from_slice(format!("{:02X}", b).as_bytes());
    }
    out.push(b'>');
    out
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8], hex: bool) {
    if hex {
        out.extend_from_slice(&encode_hex_string(bytes));
    } else {
        out.extend_from_slice(&encode_literal_string(bytes));
    }
}
