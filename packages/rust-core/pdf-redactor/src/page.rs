//! Per-stream redaction pipeline
//!
//! Composes the pipeline stages for one content stream: interpret, correlate,
//! rewrite, and (for page-level streams) marker emission. The document
//! adapter drives this once per page and once per affected Form XObject; the
//! standalone entry point [`redact_content_stream`] covers callers that
//! manage their own container.

use crate::config::RedactionConfig;
use crate::correlator::{correlate, RemovalPlan};
use crate::error::{RedactError, RedactWarning};
use crate::interpreter::interpret;
use crate::letters::Letter;
use crate::marker::append_markers;
use crate::operation::Operation;
use crate::rewriter::rewrite_stream;
use font_codec::FontRegistry;
use pdf_geometry::{Matrix, PageGeometry, Rect};
use std::collections::HashMap;

/// Interpretation plus removal plan for one content stream
pub struct StreamAnalysis {
    pub operations: Vec<Operation>,
    pub plan: RemovalPlan,
    pub warnings: Vec<RedactWarning>,
}

impl StreamAnalysis {
    /// Whether any glyph or operation is marked for removal
    pub fn has_removals(&self) -> bool {
        !self.plan.is_empty()
    }
}

/// Outcome of rewriting one content stream
pub struct StreamOutcome {
    pub bytes: Vec<u8>,
    pub glyphs_removed: usize,
    pub operations_rewritten: usize,
    pub warnings: Vec<RedactWarning>,
}

/// Interpret a stream and build its removal plan
///
/// `areas` must be in content-stream space; `initial_ctm` is identity for a
/// page stream and the compounded transform inside a Form XObject.
pub fn analyze_stream(
    content: &[u8],
    fonts: &FontRegistry,
    letters: &[Letter],
    areas: &[Rect],
    initial_ctm: Matrix,
    config: &RedactionConfig,
    cancel: &dyn Fn() -> bool,
) -> Result<StreamAnalysis, RedactError> {
    let mut warnings = Vec::new();
    let operations = interpret(content, fonts, initial_ctm, &mut warnings, cancel)?;
    let plan = correlate(
        &operations,
        letters,
        areas,
        fonts,
        config.glyph_removal_strategy,
        &mut warnings,
    );
    Ok(StreamAnalysis {
        operations,
        plan,
        warnings,
    })
}

/// Emit the rewritten stream for an analysis
///
/// `xobject_renames` redirects `Do` sites to replacement XObjects;
/// `markers` is set for page-level streams when the configuration asks for
/// visual markers.
pub fn emit_stream(
    source: &[u8],
    analysis: &StreamAnalysis,
    xobject_renames: &HashMap<usize, String>,
    markers: Option<(&[Rect], &PageGeometry)>,
    config: &RedactionConfig,
) -> Result<StreamOutcome, RedactError> {
    let outcome = rewrite_stream(source, &analysis.operations, &analysis.plan, xobject_renames)?;
    let mut bytes = outcome.bytes;
    if let Some((areas_visual, geometry)) = markers {
        if config.draw_visual_marker && !areas_visual.is_empty() {
            append_markers(&mut bytes, areas_visual, geometry, &config.marker_color);
        }
    }
    Ok(StreamOutcome {
        bytes,
        glyphs_removed: analysis.plan.glyphs_marked(),
        operations_rewritten: outcome.operations_rewritten,
        warnings: analysis.warnings.clone(),
    })
}

/// Redact one standalone content stream
///
/// Areas arrive in visual space and are mapped through the page geometry;
/// markers are appended when configured. Form XObjects are not followed
/// here; use the document adapter for documents with form content.
pub fn redact_content_stream(
    content: &[u8],
    fonts: &FontRegistry,
    letters: &[Letter],
    areas_visual: &[Rect],
    geometry: &PageGeometry,
    config: &RedactionConfig,
    cancel: &dyn Fn() -> bool,
) -> Result<StreamOutcome, RedactError> {
    let areas_content: Vec<Rect> = areas_visual
        .iter()
        .map(|r| geometry.visual_to_content(r))
        .collect();
    let analysis = analyze_stream(
        content,
        fonts,
        letters,
        &areas_content,
        Matrix::IDENTITY,
        config,
        cancel,
    )?;
    emit_stream(
        content,
        &analysis,
        &HashMap::new(),
        Some((areas_visual, geometry)),
        config,
    )
}
