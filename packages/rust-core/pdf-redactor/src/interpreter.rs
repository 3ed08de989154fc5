//! Content stream interpreter
//!
//! Consumes tokens, maintains the graphics and text state machines, and
//! produces the typed operation stream. Structural violations (nested `BT`,
//! truncated operands, unterminated constructs) abort with
//! [`RedactError::MalformedStream`]; unbalanced `q`/`Q` or `BT`/`ET` in an
//! otherwise readable stream only warn.

use crate::error::{RedactError, RedactWarning};
use crate::glyphs::decode_show;
use crate::operation::{
    OpKind, OperandPiece, Operation, PenSensitivity, ShowOperator, ShowTextOp,
};
use crate::state::{GraphicsStack, TextState};
use crate::tokenizer::{ContentLexer, Token, TokenKind};
use font_codec::FontRegistry;
use pdf_geometry::{Matrix, Rect};
use std::collections::HashSet;

/// Interpret a content stream into its operation stream
///
/// `initial_ctm` is identity for a page and the compounded transform inside
/// a Form XObject. The cancellation predicate is consulted once per
/// operation.
pub fn interpret(
    data: &[u8],
    fonts: &FontRegistry,
    initial_ctm: Matrix,
    warnings: &mut Vec<RedactWarning>,
    cancel: &dyn Fn() -> bool,
) -> Result<Vec<Operation>, RedactError> {
    Interpreter::new(data, fonts, initial_ctm).run(warnings, cancel)
}

struct Interpreter<'a> {
    lexer: ContentLexer<'a>,
    fonts: &'a FontRegistry,
    graphics: GraphicsStack,
    text: TextState,
    inside_text: bool,
    /// Marked-content stack; `true` entries carry `/ActualText`
    marked_content: Vec<bool>,
    operations: Vec<Operation>,
    operands: Vec<Token>,
    missing_fonts: HashSet<String>,
    warned_q_underflow: bool,
}

impl<'a> Interpreter<'a> {
    fn new(data: &'a [u8], fonts: &'a FontRegistry, initial_ctm: Matrix) -> Self {
        Self {
            lexer: ContentLexer::new(data),
            fonts,
            graphics: GraphicsStack::with_ctm(initial_ctm),
            text: TextState::default(),
            inside_text: false,
            marked_content: Vec::new(),
            operations: Vec::new(),
            operands: Vec::new(),
            missing_fonts: HashSet::new(),
            warned_q_underflow: false,
        }
    }

    fn run(
        mut self,
        warnings: &mut Vec<RedactWarning>,
        cancel: &dyn Fn() -> bool,
    ) -> Result<Vec<Operation>, RedactError> {
        while let Some(token) = self.lexer.next_token()? {
            match token.kind {
                TokenKind::Operator(_) | TokenKind::InlineImage => {
                    if cancel() {
                        return Err(RedactError::Cancelled);
                    }
                    self.close_operation(token, warnings)?;
                }
                _ => self.operands.push(token),
            }
        }
        self.finish(warnings)
    }

    fn finish(
        mut self,
        warnings: &mut Vec<RedactWarning>,
    ) -> Result<Vec<Operation>, RedactError> {
        if !self.operands.is_empty() {
            // Trailing comments are harmless; dangling operands are not
            if self.operands.iter().all(|t| t.kind == TokenKind::Comment) {
                let range = (
                    self.operands.first().unwrap().start,
                    self.operands.last().unwrap().end,
                );
                self.push_operation(range, OpKind::Opaque, PenSensitivity::None);
            } else {
                return Err(RedactError::MalformedStream(
                    "operands with no closing operator at end of stream".to_string(),
                ));
            }
        }
        if self.inside_text {
            warnings.push(RedactWarning::UnbalancedNesting {
                what: "BT without matching ET".to_string(),
            });
        }
        if self.graphics.depth() > 0 {
            warnings.push(RedactWarning::UnbalancedNesting {
                what: format!("{} q without matching Q", self.graphics.depth()),
            });
        }
        Ok(self.operations)
    }

    fn push_operation(&mut self, range: (usize, usize), kind: OpKind, pen: PenSensitivity) {
        self.operations.push(Operation {
            index: self.operations.len(),
            range,
            inside_text: self.inside_text,
            pre_text_matrix: self.text.text_matrix,
            pre_line_matrix: self.text.line_matrix,
            pen_sensitivity: pen,
            kind,
        });
    }

    /// Numeric operand at position `i` counting back from the end
    fn number_from_end(&self, i: usize) -> Option<f64> {
        let len = self.operands.len();
        match self.operands.get(len.checked_sub(i + 1)?)?.kind {
            TokenKind::Integer(n) => Some(n as f64),
            TokenKind::Real(r) => Some(r),
            _ => None,
        }
    }

    fn numbers(&self, count: usize, mnemonic: &str) -> Result<Vec<f64>, RedactError> {
        let mut values = Vec::with_capacity(count);
        for i in (0..count).rev() {
            values.push(self.number_from_end(i).ok_or_else(|| {
                RedactError::MalformedStream(format!("truncated operands for {}", mnemonic))
            })?);
        }
        Ok(values)
    }

    fn close_operation(
        &mut self,
        op_token: Token,
        warnings: &mut Vec<RedactWarning>,
    ) -> Result<(), RedactError> {
        let range = (
            self.operands.first().map(|t| t.start).unwrap_or(op_token.start),
            op_token.end,
        );
        // Snapshot before any state change so the rewriter can repair
        // positioning in front of this operation
        let pre_tm = self.text.text_matrix;
        let pre_tlm = self.text.line_matrix;

        if op_token.kind == TokenKind::InlineImage {
            // Inline images paint the unit square through the CTM
            let bbox = self
                .graphics
                .current()
                .ctm
                .transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
            self.push_with_pre(range, OpKind::InlineImage { bbox: Some(bbox) }, pre_tm, pre_tlm, PenSensitivity::None);
            self.operands.clear();
            return Ok(());
        }
        let TokenKind::Operator(mnemonic) = &op_token.kind else {
            return Err(RedactError::Internal(
                "close_operation called on non-operator token".to_string(),
            ));
        };
        let mnemonic = mnemonic.clone();

        let (kind, pen) = match mnemonic.as_str() {
            "BT" => {
                if self.inside_text {
                    return Err(RedactError::MalformedStream(
                        "nested BT inside a text object".to_string(),
                    ));
                }
                self.inside_text = true;
                self.text.begin_text_object();
                (OpKind::TextState, PenSensitivity::SetsBoth)
            }
            "ET" => {
                if !self.inside_text {
                    warnings.push(RedactWarning::UnbalancedNesting {
                        what: "ET without matching BT".to_string(),
                    });
                }
                self.inside_text = false;
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tf" => {
                let size = self.numbers(1, "Tf")?[0];
                let name = self.operands.iter().rev().find_map(|t| match &t.kind {
                    TokenKind::Name(n) => Some(n.clone()),
                    _ => None,
                });
                let Some(name) = name else {
                    return Err(RedactError::MalformedStream(
                        "Tf without a font name operand".to_string(),
                    ));
                };
                if self.fonts.get(&name).is_none() && self.missing_fonts.insert(name.clone()) {
                    warnings.push(RedactWarning::UnresolvableFont { font: name.clone() });
                }
                self.text.font_name = Some(name);
                self.text.font_size = size;
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tc" => {
                self.text.char_spacing = self.numbers(1, "Tc")?[0];
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tw" => {
                self.text.word_spacing = self.numbers(1, "Tw")?[0];
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tz" => {
                self.text.horizontal_scaling = self.numbers(1, "Tz")?[0];
                (OpKind::TextState, PenSensitivity::None)
            }
            "TL" => {
                self.text.leading = self.numbers(1, "TL")?[0];
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tr" => {
                self.text.render_mode = self.numbers(1, "Tr")?[0] as u8;
                (OpKind::TextState, PenSensitivity::None)
            }
            "Ts" => {
                self.text.rise = self.numbers(1, "Ts")?[0];
                (OpKind::TextState, PenSensitivity::None)
            }
            "Tm" => {
                let v = self.numbers(6, "Tm")?;
                self.text
                    .set_matrix(Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]));
                (OpKind::TextState, PenSensitivity::SetsBoth)
            }
            "Td" => {
                let v = self.numbers(2, "Td")?;
                self.text.next_line(v[0], v[1]);
                (OpKind::TextState, PenSensitivity::ReadsLine)
            }
            "TD" => {
                let v = self.numbers(2, "TD")?;
                self.text.next_line_set_leading(v[0], v[1]);
                (OpKind::TextState, PenSensitivity::ReadsLine)
            }
            "T*" => {
                self.text.next_line_by_leading();
                (OpKind::TextState, PenSensitivity::ReadsLine)
            }
            "Tj" | "TJ" | "'" | "\"" => {
                let show = self.build_show(&mnemonic)?;
                let pen = match show.operator {
                    ShowOperator::ShowString | ShowOperator::ShowAdjusted => {
                        PenSensitivity::ReadsPen
                    }
                    _ => PenSensitivity::ReadsLine,
                };
                (OpKind::ShowText(Box::new(show)), pen)
            }
            "q" => {
                self.graphics.save();
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "Q" => {
                if !self.graphics.restore() && !self.warned_q_underflow {
                    self.warned_q_underflow = true;
                    warnings.push(RedactWarning::UnbalancedNesting {
                        what: "Q without matching q".to_string(),
                    });
                }
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "cm" => {
                let v = self.numbers(6, "cm")?;
                self.graphics
                    .concat_matrix(Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]));
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "w" => {
                if let Some(width) = self.number_from_end(0) {
                    self.graphics.current_mut().line_width = width;
                }
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "rg" => {
                if let Ok(v) = self.numbers(3, "rg") {
                    self.graphics.current_mut().fill_color = (v[0], v[1], v[2]);
                }
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "RG" => {
                if let Ok(v) = self.numbers(3, "RG") {
                    self.graphics.current_mut().stroke_color = (v[0], v[1], v[2]);
                }
                (OpKind::GraphicsState, PenSensitivity::None)
            }
            "g" | "G" | "k" | "K" | "cs" | "CS" | "sc" | "scn" | "SC" | "SCN" | "gs" | "d"
            | "j" | "J" | "M" | "ri" | "i" => (OpKind::GraphicsState, PenSensitivity::None),
            "m" | "l" | "c" | "v" | "y" | "h" | "re" | "S" | "s" | "f" | "F" | "f*" | "B"
            | "B*" | "b" | "b*" | "n" | "W" | "W*" => (OpKind::Path, PenSensitivity::None),
            "Do" => {
                let name = self.operands.iter().rev().find_map(|t| match &t.kind {
                    TokenKind::Name(n) => Some(n.clone()),
                    _ => None,
                });
                let Some(name) = name else {
                    return Err(RedactError::MalformedStream(
                        "Do without an XObject name operand".to_string(),
                    ));
                };
                (
                    OpKind::XObject {
                        name,
                        ctm: self.graphics.current().ctm,
                    },
                    PenSensitivity::None,
                )
            }
            "BMC" => {
                self.marked_content.push(false);
                (OpKind::MarkedContent, PenSensitivity::None)
            }
            "BDC" => {
                let has_actual_text = self.operands.iter().any(|t| {
                    matches!(&t.kind, TokenKind::Name(n) if n == "ActualText")
                });
                self.marked_content.push(has_actual_text);
                (OpKind::MarkedContent, PenSensitivity::None)
            }
            "EMC" => {
                self.marked_content.pop();
                (OpKind::MarkedContent, PenSensitivity::None)
            }
            "MP" | "DP" => (OpKind::MarkedContent, PenSensitivity::None),
            _ => (OpKind::Opaque, PenSensitivity::None),
        };

        self.push_with_pre(range, kind, pre_tm, pre_tlm, pen);
        self.operands.clear();
        Ok(())
    }

    fn push_with_pre(
        &mut self,
        range: (usize, usize),
        kind: OpKind,
        pre_tm: Matrix,
        pre_tlm: Matrix,
        pen: PenSensitivity,
    ) {
        self.operations.push(Operation {
            index: self.operations.len(),
            range,
            inside_text: self.inside_text,
            pre_text_matrix: pre_tm,
            pre_line_matrix: pre_tlm,
            pen_sensitivity: pen,
            kind,
        });
    }

    /// Build a show operation, applying `'`/`"` side effects first
    fn build_show(&mut self, mnemonic: &str) -> Result<ShowTextOp, RedactError> {
        let (operator, quote_spacing) = match mnemonic {
            "Tj" => (ShowOperator::ShowString, None),
            "TJ" => (ShowOperator::ShowAdjusted, None),
            "'" => {
                self.text.next_line_by_leading();
                (ShowOperator::NextLineShow, None)
            }
            "\"" => {
                // aw ac string: word spacing, char spacing, then next line
                let string_pos = self
                    .operands
                    .iter()
                    .rposition(|t| {
                        matches!(
                            t.kind,
                            TokenKind::LiteralString(_) | TokenKind::HexString(_)
                        )
                    })
                    .ok_or_else(|| {
                        RedactError::MalformedStream("\" without a string operand".to_string())
                    })?;
                let number_at = |i: usize| -> Option<f64> {
                    match self.operands.get(i)?.kind {
                        TokenKind::Integer(n) => Some(n as f64),
                        TokenKind::Real(r) => Some(r),
                        _ => None,
                    }
                };
                let (aw, ac) = match (
                    string_pos.checked_sub(2).and_then(number_at),
                    string_pos.checked_sub(1).and_then(number_at),
                ) {
                    (Some(aw), Some(ac)) => (aw, ac),
                    _ => {
                        return Err(RedactError::MalformedStream(
                            "truncated operands for \"".to_string(),
                        ));
                    }
                };
                self.text.word_spacing = aw;
                self.text.char_spacing = ac;
                self.text.next_line_by_leading();
                (ShowOperator::SpacingNextLineShow, Some((aw, ac)))
            }
            _ => {
                return Err(RedactError::Internal(format!(
                    "build_show called for {}",
                    mnemonic
                )));
            }
        };

        let pieces = self.collect_pieces(operator)?;
        let font = self
            .text
            .font_name
            .as_deref()
            .and_then(|name| self.fonts.get(name));
        let state = self.text.snapshot(self.graphics.current().ctm);
        let decoded = decode_show(&pieces, &state, font);
        self.text.text_matrix = decoded.end_text_matrix;

        Ok(ShowTextOp {
            operator,
            pieces,
            quote_spacing,
            leading_adjust: decoded.leading_adjust,
            glyphs: decoded.glyphs,
            state,
            end_text_matrix: decoded.end_text_matrix,
            bbox: decoded.bbox,
            in_actual_text: self.marked_content.iter().any(|b| *b),
        })
    }

    fn collect_pieces(&self, operator: ShowOperator) -> Result<Vec<OperandPiece>, RedactError> {
        match operator {
            ShowOperator::ShowAdjusted => {
                let open = self
                    .operands
                    .iter()
                    .rposition(|t| t.kind == TokenKind::ArrayOpen)
                    .ok_or_else(|| {
                        RedactError::MalformedStream("TJ without an array operand".to_string())
                    })?;
                let mut pieces = Vec::new();
                for token in &self.operands[open + 1..] {
                    match &token.kind {
                        TokenKind::LiteralString(bytes) => pieces.push(OperandPiece::Text {
                            bytes: bytes.clone(),
                            hex: false,
                        }),
                        TokenKind::HexString(bytes) => pieces.push(OperandPiece::Text {
                            bytes: bytes.clone(),
                            hex: true,
                        }),
                        TokenKind::Integer(n) => pieces.push(OperandPiece::Adjust(*n as f64)),
                        TokenKind::Real(r) => pieces.push(OperandPiece::Adjust(*r)),
                        TokenKind::ArrayClose | TokenKind::Comment => {}
                        other => {
                            return Err(RedactError::MalformedStream(format!(
                                "unexpected {:?} in TJ array",
                                other
                            )));
                        }
                    }
                }
                Ok(pieces)
            }
            _ => {
                let piece = self.operands.iter().rev().find_map(|t| match &t.kind {
                    TokenKind::LiteralString(bytes) => Some(OperandPiece::Text {
                        bytes: bytes.clone(),
                        hex: false,
                    }),
                    TokenKind::HexString(bytes) => Some(OperandPiece::Text {
                        bytes: bytes.clone(),
                        hex: true,
                    }),
                    _ => None,
                });
                piece.map(|p| vec![p]).ok_or_else(|| {
                    RedactError::MalformedStream(
                        "text-showing operator without a string operand".to_string(),
                    )
                })
            }
        }
    }
}
