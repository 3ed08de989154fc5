//! Visual redaction markers
//!
//! After the glyphs are gone, a filled rectangle is painted over each
//! redaction area so the document shows where content was removed. Each
//! marker is its own `q ... Q` group appended after the rewritten stream, so
//! it inherits nothing from and leaks nothing into the page's own graphics
//! state.

use crate::config::MarkerColor;
use crate::rewriter::fmt_number;
use pdf_geometry::{PageGeometry, Rect};

/// Append one filled rectangle per redaction area
///
/// `areas` are in visual space; the page geometry maps them into
/// content-stream coordinates, which is where the operators paint.
pub fn append_markers(
    out: &mut Vec<u8>,
    areas: &[Rect],
    geometry: &PageGeometry,
    color: &MarkerColor,
) {
    for area in areas {
        let rect = geometry.visual_to_content(area);
        out.extend_from_slice(b"q\n");
        out.extend_from_slice(
            format!(
                "{} {} {} rg\n",
                fmt_number(color.r),
                fmt_number(color.g),
                fmt_number(color.b)
            )
            .as_bytes(),
        );
        out.extend_from_slice(
            format!(
                "{} {} {} {} re\n",
                fmt_number(rect.left),
                fmt_number(rect.bottom),
                fmt_number(rect.width()),
                fmt_number(rect.height())
            )
            .as_bytes(),
        );
        out.extend_from_slice(b"f\nQ\n");
    }
}
