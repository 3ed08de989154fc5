//! Form XObject resolution for the recursion driver
//!
//! The document adapter recurses into Form XObjects whose bounds intersect a
//! redaction area. This module resolves a `Do` target into the data the
//! recursion needs (content, resources, compounded transform) and allocates
//! the fresh resource names used by the copy-on-modify replacement scheme:
//! a rewritten form gets a new stream object under a new name, and only the
//! referencing sites that needed redaction are retargeted.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdf_geometry::{Matrix, Rect};

/// A resolved Form XObject invocation
pub struct ResolvedForm {
    /// Object id of the form's stream
    pub id: ObjectId,
    /// Decompressed content bytes
    pub content: Vec<u8>,
    /// The form's stream dictionary (for building the replacement stream)
    pub stream_dict: Dictionary,
    /// The form's own resources; `None` means it inherits the caller's
    pub resources: Option<Dictionary>,
    /// Compounded transform: form `/Matrix`, then the CTM at the `Do` site
    pub ctm: Matrix,
    /// The form's `/BBox` mapped through the compounded transform
    pub mapped_bbox: Option<Rect>,
}

fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
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
    if arr.len() < 4 {
        return None;
    }
    let values: Vec<f64> = arr
        .iter()
        .filter_map(|o| object_to_f64(resolve_ref(doc, o)))
        .collect();
    if values.len() < 4 {
        return None;
    }
    Some(Rect::from_corners(values[0], values[1], values[2], values[3]))
}

fn matrix_from_array(doc: &Document, obj: &Object) -> Option<Matrix> {
    let arr = resolve_ref(doc, obj).as_array().ok()?;
    let values: Vec<f64> = arr
        .iter()
        .filter_map(|o| object_to_f64(resolve_ref(doc, o)))
        .collect();
    if values.len() < 6 {
        return None;
    }
    Some(Matrix::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}

/// Resolve a `Do` name against a resource dictionary
///
/// Returns `None` when the name is missing, the target is not a stream, or
/// its subtype is not `/Form` (image XObjects pass through untouched).
pub fn resolve_form(
    doc: &Document,
    resources: &Dictionary,
    name: &str,
    invocation_ctm: Matrix,
) -> Option<ResolvedForm> {
    let xobjects = resources
        .get(b"XObject")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())?;
    let entry = xobjects.get(name.as_bytes()).ok()?;
    let id = match entry {
        Object::Reference(id) => *id,
        _ => return None, // forms are always indirect streams
    };
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;

    let subtype = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_name().ok())
        .map(|n| n.to_vec());
    if subtype.as_deref() != Some(b"Form") {
        return None;
    }

    let form_matrix = stream
        .dict
        .get(b"Matrix")
        .ok()
        .and_then(|o| matrix_from_array(doc, o))
        .unwrap_or(Matrix::IDENTITY);
    let ctm = form_matrix.multiply(&invocation_ctm);

    let mapped_bbox = stream
        .dict
        .get(b"BBox")
        .ok()
        .and_then(|o| rect_from_array(doc, o))
        .map(|b| ctm.transform_rect(&b));

    let resources_dict = stream
        .dict
        .get(b"Resources")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned();

    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    Some(ResolvedForm {
        id,
        content,
        stream_dict: stream.dict.clone(),
        resources: resources_dict,
        ctm,
        mapped_bbox,
    })
}

/// Allocate a resource name not present in the XObject dictionary
///
/// Replacement streams get `<base>R`, `<base>R2`, ... so the original entry
/// stays valid for sites that did not need redaction.
pub fn fresh_xobject_name(xobjects: &Dictionary, base: &str) -> String {
    let candidate = format!("{}R", base);
    if !xobjects.has(candidate.as_bytes()) {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}R{}", base, counter);
        if !xobjects.has(candidate.as_bytes()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn doc_with_form(subtype: &[u8]) -> (Document, Dictionary) {
        let mut doc = Document::with_version("1.7");
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => Object::Name(b"XObject".to_vec()),
                "Subtype" => Object::Name(subtype.to_vec()),
                "BBox" => Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(100),
                    Object::Integer(50),
                ]),
                "Matrix" => Object::Array(vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(10),
                    Object::Integer(20),
                ]),
            },
            b"BT ET".to_vec(),
        ));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! {
                "Fm0" => Object::Reference(form_id),
            }),
        };
        (doc, resources)
    }

    #[test]
    fn test_resolve_form_compounds_matrices() {
        let (doc, resources) = doc_with_form(b"Form");
        let form = resolve_form(&doc, &resources, "Fm0", Matrix::scale(2.0, 2.0)).unwrap();
        // BBox (0,0,100,50) through /Matrix translate(10,20) then scale(2)
        let bbox = form.mapped_bbox.unwrap();
        assert_eq!(bbox.left, 20.0);
        assert_eq!(bbox.bottom, 40.0);
        assert_eq!(bbox.right, 220.0);
        assert_eq!(bbox.top, 140.0);
        assert_eq!(form.content, b"BT ET");
    }

    #[test]
    fn test_image_xobjects_are_not_forms() {
        let (doc, resources) = doc_with_form(b"Image");
        assert!(resolve_form(&doc, &resources, "Fm0", Matrix::IDENTITY).is_none());
    }

    #[test]
    fn test_unknown_name_is_none() {
        let (doc, resources) = doc_with_form(b"Form");
        assert!(resolve_form(&doc, &resources, "Nope", Matrix::IDENTITY).is_none());
    }

    #[test]
    fn test_fresh_name_avoids_collisions() {
        let xobjects = dictionary! {
            "Fm0" => Object::Null,
            "Fm0R" => Object::Null,
        };
        assert_eq!(fresh_xobject_name(&xobjects, "Fm0"), "Fm0R2");
        let empty = dictionary! {};
        assert_eq!(fresh_xobject_name(&empty, "Fm0"), "Fm0R");
    }
}
