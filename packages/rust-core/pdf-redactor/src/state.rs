//! Graphics and text state machines
//!
//! Two layered states drive interpretation: the graphics state (CTM plus the
//! painting parameters the data model tracks) follows `q`/`Q` nesting, and
//! the text state lives inside each `BT`/`ET` frame. The interpreter owns
//! both and snapshots them onto show operations.

use crate::operation::TextSnapshot;
use pdf_geometry::Matrix;

/// Text state within a text object
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
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
}

impl Default for TextState {
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
        }
    }
}

impl TextState {
    /// `BT`: both matrices reset to identity; the parameter state persists
    /// across text objects
    pub fn begin_text_object(&mut self) {
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    /// `Tm a b c d e f`
    pub fn set_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td tx ty`
    pub fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD tx ty` (`Td` plus `TL = -ty`)
    pub fn next_line_set_leading(&mut self, tx: f64, ty: f64) {
        self.leading = -ty;
        self.next_line(tx, ty);
    }

    /// `T*` (`Td 0 -leading`)
    pub fn next_line_by_leading(&mut self) {
        self.next_line(0.0, -self.leading);
    }

    /// Snapshot for a show operation, paired with the current CTM
    pub fn snapshot(&self, ctm: Matrix) -> TextSnapshot {
        TextSnapshot {
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            char_spacing: self.char_spacing,
            word_spacing: self.word_spacing,
            horizontal_scaling: self.horizontal_scaling,
            leading: self.leading,
            rise: self.rise,
            render_mode: self.render_mode,
            text_matrix: self.text_matrix,
            line_matrix: self.line_matrix,
            ctm,
        }
    }
}

/// Graphics state parameters the pipeline tracks
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub stroke_color: (f64, f64, f64),
    pub fill_color: (f64, f64, f64),
    pub line_width: f64,
    pub dash_pattern: Vec<f64>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            stroke_color: (0.0, 0.0, 0.0),
            fill_color: (0.0, 0.0, 0.0),
            line_width: 1.0,
            dash_pattern: Vec::new(),
        }
    }
}

/// `q`/`Q` stack over the graphics state
#[derive(Debug, Clone, Default)]
pub struct GraphicsStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStack {
    /// Start with a seeded CTM (page identity, or the compounded transform
    /// inside a Form XObject)
    pub fn with_ctm(ctm: Matrix) -> Self {
        Self {
            current: GraphicsState {
                ctm,
                ..GraphicsState::default()
            },
            saved: Vec::new(),
        }
    }

    /// Current state
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    /// Mutable current state
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    /// `q`
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// `Q`; returns false on underflow (unbalanced nesting, non-fatal)
    pub fn restore(&mut self) -> bool {
        match self.saved.pop() {
            Some(state) => {
                self.current = state;
                true
            }
            None => false,
        }
    }

    /// `cm`: premultiply the CTM
    pub fn concat_matrix(&mut self, m: Matrix) {
        self.current.ctm = m.multiply(&self.current.ctm);
    }

    /// Save depth, for end-of-stream balance checks
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bt_resets_matrices_only() {
        let mut state = TextState {
            font_size: 12.0,
            leading: 14.0,
            text_matrix: Matrix::translation(5.0, 5.0),
            ..TextState::default()
        };
        state.begin_text_object();
        assert_eq!(state.text_matrix, Matrix::IDENTITY);
        assert_eq!(state.line_matrix, Matrix::IDENTITY);
        assert_eq!(state.font_size, 12.0);
        assert_eq!(state.leading, 14.0);
    }

    #[test]
    fn test_td_moves_line_matrix() {
        let mut state = TextState::default();
        state.set_matrix(Matrix::translation(100.0, 700.0));
        state.next_line(0.0, -14.0);
        assert_eq!(state.text_matrix.e, 100.0);
        assert_eq!(state.text_matrix.f, 686.0);
        assert_eq!(state.line_matrix, state.text_matrix);
    }

    #[test]
    fn test_td_is_relative_to_line_start_not_pen() {
        let mut state = TextState::default();
        state.set_matrix(Matrix::translation(100.0, 700.0));
        // Simulate a show advancing the pen but not the line matrix
        state.text_matrix = Matrix::translation(40.0, 0.0).multiply(&state.text_matrix);
        state.next_line(0.0, -14.0);
        assert_eq!(state.text_matrix.e, 100.0);
        assert_eq!(state.text_matrix.f, 686.0);
    }

    #[test]
    fn test_capital_td_sets_leading() {
        let mut state = TextState::default();
        state.next_line_set_leading(0.0, -12.0);
        assert_eq!(state.leading, 12.0);
    }

    #[test]
    fn test_t_star_uses_leading() {
        let mut state = TextState::default();
        state.leading = 14.0;
        state.set_matrix(Matrix::translation(72.0, 720.0));
        state.next_line_by_leading();
        assert_eq!(state.text_matrix.f, 706.0);
    }

    #[test]
    fn test_graphics_stack_save_restore() {
        let mut stack = GraphicsStack::default();
        stack.current_mut().fill_color = (1.0, 0.0, 0.0);
        stack.save();
        stack.current_mut().fill_color = (0.0, 1.0, 0.0);
        assert!(stack.restore());
        assert_eq!(stack.current().fill_color, (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_graphics_stack_underflow_reports() {
        let mut stack = GraphicsStack::default();
        assert!(!stack.restore());
    }

    #[test]
    fn test_cm_premultiplies() {
        let mut stack = GraphicsStack::with_ctm(Matrix::translation(10.0, 0.0));
        stack.concat_matrix(Matrix::scale(2.0, 2.0));
        // Point (1, 1): scale first, then the seeded translation
        let p = stack
            .current()
            .ctm
            .transform_point(pdf_geometry::Point::new(1.0, 1.0));
        assert_eq!(p.x, 12.0);
        assert_eq!(p.y, 2.0);
    }
}
