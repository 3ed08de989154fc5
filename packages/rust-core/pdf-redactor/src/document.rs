//! Document adapter
//!
//! Binds the per-stream pipeline to a `lopdf::Document`: resolves page
//! geometry and resources, decompresses content, drives Form XObject
//! recursion with copy-on-modify replacement, writes rewritten streams back,
//! scrubs intersecting annotations, and sanitizes document metadata.

use crate::config::RedactionConfig;
use crate::error::{PageReport, RedactError, RedactWarning, RedactionReport};
use crate::letters::{Letter, LetterSource};
use crate::marker::append_markers;
use crate::operation::OpKind;
use crate::page::{analyze_stream, emit_stream};
use crate::xobject::{fresh_xobject_name, resolve_form};
use font_codec::FontRegistry;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use pdf_geometry::{Matrix, PageGeometry, Rect};
use std::collections::{HashMap, HashSet};

/// Info dictionary fields cleared by metadata sanitization
const SANITIZED_INFO_FIELDS: &[&[u8]] = &[
    b"Title", b"Author", b"Subject", b"Keywords", b"Creator",
];

/// Outcome of redacting one stream and everything it invokes
struct TreeOutcome {
    bytes: Vec<u8>,
    /// Updated resources when an XObject entry was retargeted
    resources: Option<Dictionary>,
    glyphs_removed: usize,
    operations_rewritten: usize,
    warnings: Vec<RedactWarning>,
    /// Whether anything changed (removals or retargeted XObjects)
    modified: bool,
}

/// Glyph-level redactor over a loaded PDF document
///
/// # Examples
///
/// ```no_run
/// use pdf_redactor::{PdfRedactor, RedactionConfig, Letter};
/// use pdf_geometry::Rect;
///
/// let bytes = std::fs::read("input.pdf").unwrap();
/// let mut redactor = PdfRedactor::from_bytes(&bytes).unwrap();
///
/// # let letters: Vec<Letter> = vec![];
/// let areas = [Rect::new(100.0, 700.0, 220.0, 714.0)];
/// let report = redactor.redact_page(1, &areas, &letters, &|| false).unwrap();
/// println!("removed {} glyphs", report.glyphs_removed);
///
/// let output = redactor.save_to_bytes().unwrap();
/// std::fs::write("redacted.pdf", output).unwrap();
/// ```
pub struct PdfRedactor {
    doc: Document,
    config: RedactionConfig,
}

impl PdfRedactor {
    /// Wrap an already-loaded document with the default configuration
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, RedactionConfig::default())
    }

    /// Wrap an already-loaded document
    pub fn with_config(doc: Document, config: RedactionConfig) -> Self {
        Self { doc, config }
    }

    /// Load a document from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RedactError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| RedactError::Container(format!("failed to load document: {}", e)))?;
        Ok(Self::new(doc))
    }

    /// Access the underlying document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Take the underlying document back
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Serialize the document
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, RedactError> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| RedactError::Container(format!("failed to save document: {}", e)))?;
        Ok(out)
    }

    /// Redact several pages, pulling letters from the extractor
    ///
    /// Stops at the first fatal error; pages already processed remain
    /// redacted in the document.
    pub fn redact_pages(
        &mut self,
        areas_by_page: &HashMap<u32, Vec<Rect>>,
        letters: &dyn LetterSource,
        cancel: &dyn Fn() -> bool,
    ) -> Result<RedactionReport, RedactError> {
        let mut report = RedactionReport::default();
        let mut page_numbers: Vec<u32> = areas_by_page.keys().copied().collect();
        page_numbers.sort_unstable();
        for page_number in page_numbers {
            let areas = &areas_by_page[&page_number];
            let page_letters = letters.letters_for_page(page_number);
            report
                .pages
                .push(self.redact_page(page_number, areas, &page_letters, cancel)?);
        }
        Ok(report)
    }

    /// Redact one page
    ///
    /// `areas` are rectangles in visual space; `letters` are the extractor's
    /// output for this page. On success the page's content stream (and any
    /// affected Form XObjects) are replaced in the document. On a fatal
    /// error the page is left untouched.
    pub fn redact_page(
        &mut self,
        page_number: u32,
        areas: &[Rect],
        letters: &[Letter],
        cancel: &dyn Fn() -> bool,
    ) -> Result<PageReport, RedactError> {
        let page_id = self.page_id(page_number)?;
        let geometry = self.page_geometry(page_id)?;
        let content = self.page_content(page_id)?;
        let resources = self.page_resources(page_id);

        let areas_content: Vec<Rect> = areas.iter().map(|r| geometry.visual_to_content(r)).collect();

        let mut visited = HashSet::new();
        visited.insert(page_id);
        let mut outcome = self.redact_stream_tree(
            &content,
            &resources,
            Matrix::IDENTITY,
            &areas_content,
            letters,
            &mut visited,
            cancel,
        )?;

        if self.config.draw_visual_marker && !areas.is_empty() {
            append_markers(&mut outcome.bytes, areas, &geometry, &self.config.marker_color);
            outcome.modified = true;
        }

        if outcome.modified {
            let stream_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, outcome.bytes));
            if let Some(updated) = outcome.resources.take() {
                self.set_page_entry(page_id, "Resources", Object::Dictionary(updated));
            }
            self.set_page_entry(page_id, "Contents", Object::Reference(stream_id));
        }

        let annotations_removed = self.remove_intersecting_annotations(page_id, &areas_content);

        Ok(PageReport {
            page_number,
            glyphs_removed: outcome.glyphs_removed,
            operations_rewritten: outcome.operations_rewritten,
            annotations_removed,
            warnings: outcome.warnings,
        })
    }

    /// Clear identifying text from the Info dictionary and drop the XMP
    /// metadata stream
    ///
    /// Residual names and titles frequently restate redacted content, so a
    /// redaction pass ends by scrubbing them. Producer is kept.
    pub fn sanitize_metadata(&mut self) -> usize {
        let mut cleared = 0;
        let info_id = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if let Some(info_id) = info_id {
            if let Ok(Object::Dictionary(info)) = self.doc.get_object_mut(info_id) {
                for field in SANITIZED_INFO_FIELDS {
                    if info.remove(field).is_some() {
                        cleared += 1;
                    }
                }
            }
        }
        let root_id = match self.doc.trailer.get(b"Root") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if let Some(root_id) = root_id {
            if let Ok(Object::Dictionary(catalog)) = self.doc.get_object_mut(root_id) {
                if catalog.remove(b"Metadata").is_some() {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    // ========================================================================
    // Recursion driver
    // ========================================================================

    /// Redact one stream and recurse into intersecting Form XObjects
    #[allow(clippy::too_many_arguments)]
    fn redact_stream_tree(
        &mut self,
        content: &[u8],
        resources: &Dictionary,
        ctm: Matrix,
        areas_content: &[Rect],
        letters: &[Letter],
        visited: &mut HashSet<ObjectId>,
        cancel: &dyn Fn() -> bool,
    ) -> Result<TreeOutcome, RedactError> {
        let (fonts, font_errors) = FontRegistry::from_resources(&self.doc, resources);
        let mut warnings: Vec<RedactWarning> = font_errors
            .into_iter()
            .map(|e| RedactWarning::UnsupportedFeature {
                what: format!("font entry: {}", e),
            })
            .collect();

        let analysis = analyze_stream(
            content,
            &fonts,
            letters,
            areas_content,
            ctm,
            &self.config,
            cancel,
        )?;
        warnings.extend(analysis.warnings.iter().cloned());

        let mut glyphs_removed = analysis.plan.glyphs_marked();
        let mut operations_rewritten = 0usize;
        let mut renames: HashMap<usize, String> = HashMap::new();
        let mut updated_resources: Option<Dictionary> = None;

        if self.config.recurse_form_xobjects {
            // Collect sites first; recursion mutates the document
            let sites: Vec<(usize, String, Matrix)> = analysis
                .operations
                .iter()
                .filter_map(|op| match &op.kind {
                    OpKind::XObject { name, ctm } => Some((op.index, name.clone(), *ctm)),
                    _ => None,
                })
                .collect();

            for (op_index, name, site_ctm) in sites {
                let Some(form) = resolve_form(&self.doc, resources, &name, site_ctm) else {
                    continue;
                };
                let intersects = form
                    .mapped_bbox
                    .map(|b| areas_content.iter().any(|a| a.intersects(&b)))
                    .unwrap_or(true); // no BBox: recurse to stay safe
                if !intersects {
                    continue;
                }
                if visited.contains(&form.id) {
                    warnings.push(RedactWarning::CircularXObject { name: name.clone() });
                    continue;
                }
                visited.insert(form.id);
                let form_resources = form.resources.clone().unwrap_or_else(|| resources.clone());
                let inner = self.redact_stream_tree(
                    &form.content,
                    &form_resources,
                    form.ctm,
                    areas_content,
                    letters,
                    visited,
                    cancel,
                )?;
                visited.remove(&form.id);
                warnings.extend(inner.warnings);
                if !inner.modified {
                    continue;
                }
                glyphs_removed += inner.glyphs_removed;
                operations_rewritten += inner.operations_rewritten;

                // Copy-on-modify: a new stream object under a fresh name;
                // other sites keep referencing the original
                let mut new_dict = form.stream_dict.clone();
                if let Some(inner_resources) = inner.resources {
                    new_dict.set("Resources", Object::Dictionary(inner_resources));
                }
                new_dict.remove(b"Filter");
                new_dict.remove(b"DecodeParms");
                let new_id = self.doc.add_object(Stream::new(new_dict, inner.bytes));

                let base = updated_resources.get_or_insert_with(|| resources.clone());
                let mut xobjects = base
                    .get(b"XObject")
                    .ok()
                    .map(|o| resolve_dict(&self.doc, o))
                    .unwrap_or_default();
                let new_name = fresh_xobject_name(&xobjects, &name);
                xobjects.set(new_name.clone(), Object::Reference(new_id));
                base.set("XObject", Object::Dictionary(xobjects));
                renames.insert(op_index, new_name);
            }
        }

        let markers = None; // markers are a page-level concern
        let emitted = emit_stream(content, &analysis, &renames, markers, &self.config)?;
        operations_rewritten += emitted.operations_rewritten;
        let modified = !analysis.plan.is_empty() || !renames.is_empty();

        Ok(TreeOutcome {
            bytes: emitted.bytes,
            resources: updated_resources,
            glyphs_removed,
            operations_rewritten,
            warnings,
            modified,
        })
    }

    // ========================================================================
    // Page plumbing
    // ========================================================================

    fn page_id(&self, page_number: u32) -> Result<ObjectId, RedactError> {
        self.doc
            .get_pages()
            .get(&page_number)
            .copied()
            .ok_or_else(|| RedactError::Container(format!("page {} not found", page_number)))
    }

    /// Page attribute with `/Parent` inheritance
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut current = page_id;
        for _ in 0..32 {
            let dict = self.doc.get_object(current).ok()?.as_dict().ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(resolve_ref(&self.doc, value));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
        None
    }

    fn page_geometry(&self, page_id: ObjectId) -> Result<PageGeometry, RedactError> {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|o| rect_from_array(&self.doc, o))
            .ok_or_else(|| RedactError::Container("page has no MediaBox".to_string()))?;
        let rotate = self
            .inherited(page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        PageGeometry::new(media_box.width(), media_box.height(), rotate)
            .map_err(|e| RedactError::Container(format!("invalid page geometry: {}", e)))
    }

    /// Concatenated, decompressed page content
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>, RedactError> {
        let dict = self
            .doc
            .get_object(page_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| RedactError::Container("page object is not a dictionary".to_string()))?;
        let mut stream_ids = Vec::new();
        match dict.get(b"Contents") {
            Ok(Object::Reference(id)) => stream_ids.push(*id),
            Ok(Object::Array(items)) => {
                for item in items {
                    if let Object::Reference(id) = item {
                        stream_ids.push(*id);
                    }
                }
            }
            _ => {}
        }
        let mut content = Vec::new();
        for id in stream_ids {
            let stream = self
                .doc
                .get_object(id)
                .ok()
                .and_then(|o| o.as_stream().ok())
                .ok_or_else(|| {
                    RedactError::Container(format!("content stream {:?} unavailable", id))
                })?;
            let bytes = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            if !content.is_empty() {
                content.push(b'\n');
            }
            content.extend_from_slice(&bytes);
        }
        Ok(content)
    }

    fn page_resources(&self, page_id: ObjectId) -> Dictionary {
        self.inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default()
    }

    fn set_page_entry(&mut self, page_id: ObjectId, key: &str, value: Object) {
        if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
            dict.set(key, value);
        }
    }

    /// Remove annotations whose rectangle intersects a redaction area
    fn remove_intersecting_annotations(
        &mut self,
        page_id: ObjectId,
        areas_content: &[Rect],
    ) -> usize {
        if areas_content.is_empty() {
            return 0;
        }
        let Some(annot_ids) = self.annotation_ids(page_id) else {
            return 0;
        };
        let mut kept = Vec::new();
        let mut removed = 0;
        for id in annot_ids {
            let rect = self
                .doc
                .get_object(id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"Rect").ok())
                .and_then(|o| rect_from_array(&self.doc, o));
            let intersects = rect
                .map(|r| areas_content.iter().any(|a| a.intersects(&r)))
                .unwrap_or(false);
            if intersects {
                removed += 1;
            } else {
                kept.push(Object::Reference(id));
            }
        }
        if removed > 0 {
            self.set_page_entry(page_id, "Annots", Object::Array(kept));
        }
        removed
    }

    fn annotation_ids(&self, page_id: ObjectId) -> Option<Vec<ObjectId>> {
        let dict = self.doc.get_object(page_id).ok()?.as_dict().ok()?;
        let annots = resolve_ref(&self.doc, dict.get(b"Annots").ok()?);
        let arr = annots.as_array().ok()?;
        Some(
            arr.iter()
                .filter_map(|o| match o {
                    Object::Reference(id) => Some(*id),
                    _ => None,
                })
                .collect(),
        )
    }
}

fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict(doc: &Document, obj: &Object) -> Dictionary {
    resolve_ref(doc, obj)
        .as_dict()
        .cloned()
        .unwrap_or_default()
}

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn rect_from_array(doc: &Document, obj: &Object) -> Option<Rect> {
    let arr = resolve_ref(doc, obj).as_array().ok()?;
    let values: Vec<f64> = arr
        .iter()
        .filter_map(|o| object_to_f64(resolve_ref(doc, o)))
        .collect();
    if values.len() < 4 {
        return None;
    }
    Some(Rect::from_corners(values[0], values[1], values[2], values[3]))
}
