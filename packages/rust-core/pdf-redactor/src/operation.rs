//! Typed operation stream
//!
//! The interpreter folds tokens into a flat vector of [`Operation`] values.
//! Every operation keeps its exact source byte range; only text-showing
//! operations carry a payload, because they are the only ones the rewriter
//! ever changes. Everything else round-trips byte-for-byte.

use pdf_geometry::{Matrix, Rect};

/// The text-showing operator family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOperator {
    /// `Tj`
    ShowString,
    /// `TJ`
    ShowAdjusted,
    /// `'` (next line, then show)
    NextLineShow,
    /// `"` (set word/char spacing, next line, then show)
    SpacingNextLineShow,
}

/// One entry of a show operand: a string piece or a kerning adjust
#[derive(Debug, Clone, PartialEq)]
pub enum OperandPiece {
    /// String bytes after escape/hex decoding, plus the source form
    Text { bytes: Vec<u8>, hex: bool },
    /// `TJ` numeric adjustment in thousandths of text space
    Adjust(f64),
}

/// Snapshot of the text and graphics state a show operation starts under
#[derive(Debug, Clone, PartialEq)]
pub struct TextSnapshot {
    pub font_name: Option<String>,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Percent, 100 = unscaled
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub rise: f64,
    pub render_mode: u8,
    pub text_matrix: Matrix,
    pub line_matrix: Matrix,
    pub ctm: Matrix,
}

impl Default for TextSnapshot {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            ctm: Matrix::IDENTITY,
        }
    }
}

/// One decoded glyph of a show operation
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Raw operand bytes for this glyph (1 or 2 bytes)
    pub bytes: Vec<u8>,
    /// CID under the owning font
    pub cid: u32,
    /// Unicode text, possibly multi-codepoint (ligatures), U+FFFD if unknown
    pub unicode: String,
    /// Index of the operand piece this glyph came from
    pub piece_index: usize,
    /// Byte offset of the glyph inside that piece
    pub byte_offset: usize,
    /// Whether the source piece was a hex string
    pub from_hex: bool,
    /// Advance in text space (font size, spacing and scaling applied)
    pub advance: f64,
    /// Bounding box in content-stream coordinates
    pub bbox: Rect,
    /// `TJ` adjust that follows this glyph, in thousandths
    pub trailing_adjust: Option<f64>,
}

/// Payload of a text-showing operation
#[derive(Debug, Clone, PartialEq)]
pub struct ShowTextOp {
    pub operator: ShowOperator,
    /// Operand pieces in source order (one for `Tj`/`'`/`"`, many for `TJ`)
    pub pieces: Vec<OperandPiece>,
    /// Word/char spacing operands of `"` (aw, ac)
    pub quote_spacing: Option<(f64, f64)>,
    /// Sum of `TJ` adjusts preceding the first glyph, in thousandths
    pub leading_adjust: f64,
    /// Decoded glyph sequence; empty when the font did not resolve
    pub glyphs: Vec<Glyph>,
    /// Effective state at the start of the show (after `'`/`"` side effects)
    pub state: TextSnapshot,
    /// Text matrix after the show completed
    pub end_text_matrix: Matrix,
    /// Union of glyph boxes in content-stream coordinates
    pub bbox: Option<Rect>,
    /// Whether the show sits inside a marked-content range with `/ActualText`
    pub in_actual_text: bool,
}

/// Classification of a non-show operation
///
/// The rewriter treats all of these identically (verbatim copy); the
/// distinction feeds the correlator's bookkeeping and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    ShowText(Box<ShowTextOp>),
    /// Text state and positioning (`Tf`, `Tc`, `Tm`, `Td`, `BT`, `ET`, ...)
    TextState,
    /// Graphics state (`q`, `Q`, `cm`, `gs`, colors, line parameters)
    GraphicsState,
    /// Path construction and painting
    Path,
    /// `Do` of an XObject, with the CTM at the invocation; the driver
    /// resolves whether it is a form
    XObject { name: String, ctm: Matrix },
    /// Entire inline image, with its mapped bounds when computable
    InlineImage { bbox: Option<Rect> },
    /// Marked content (`BMC`, `BDC`, `EMC`, `MP`, `DP`)
    MarkedContent,
    /// Anything else, passed through untouched
    Opaque,
}

/// How an operation interacts with the text positioning state, for the
/// rewriter's state-repair logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenSensitivity {
    /// Reads the text matrix directly (`Tj`, `TJ`)
    ReadsPen,
    /// Reads the line matrix (`Td`, `TD`, `T*`, `'`, `"`)
    ReadsLine,
    /// Sets both matrices absolutely (`Tm`, `BT`)
    SetsBoth,
    /// Indifferent
    None,
}

/// One operation of the stream
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Position in the stream, strictly increasing
    pub index: usize,
    /// Exact source byte range (first operand through operator)
    pub range: (usize, usize),
    /// Whether the operation sits inside a `BT`/`ET` frame
    pub inside_text: bool,
    /// Text/line matrices before the operation, for state repair
    pub pre_text_matrix: Matrix,
    pub pre_line_matrix: Matrix,
    /// Positioning sensitivity of the mnemonic
    pub pen_sensitivity: PenSensitivity,
    pub kind: OpKind,
}

impl Operation {
    /// The show payload, if this is a text-showing operation
    pub fn as_show(&self) -> Option<&ShowTextOp> {
        match &self.kind {
            OpKind::ShowText(show) => Some(show),
            _ => None,
        }
    }
}
