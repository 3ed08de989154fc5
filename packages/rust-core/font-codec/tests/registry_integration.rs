//! Integration tests for font resolution through object references
//!
//! Real documents store font dictionaries, descendant fonts and ToUnicode
//! CMaps as indirect objects; these tests exercise the reference-resolution
//! paths that the in-module unit tests (which use inline dictionaries) skip.

use font_codec::{FontKind, FontRegistry, REPLACEMENT};
use lopdf::{dictionary, Document, Object, Stream};

const TOUNICODE_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0041> <005A> <0041>
endbfrange
2 beginbfchar
<0048> <0048>
<00FB> <00660069>
endbfchar
endcmap
end
end";

fn composite_document() -> (Document, lopdf::Dictionary) {
    let mut doc = Document::with_version("1.7");

    let tounicode_id = doc.add_object(Stream::new(dictionary! {}, TOUNICODE_CMAP.to_vec()));

    let descendant_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"CIDFontType2".to_vec()),
        "BaseFont" => Object::Name(b"Inter".to_vec()),
        "DW" => Object::Integer(1000),
        "W" => Object::Array(vec![
            Object::Integer(0x41),
            Object::Integer(0x5A),
            Object::Integer(722),
        ]),
    });

    let font_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type0".to_vec()),
        "BaseFont" => Object::Name(b"Inter".to_vec()),
        "Encoding" => Object::Name(b"Identity-H".to_vec()),
        "DescendantFonts" => Object::Array(vec![Object::Reference(descendant_id)]),
        "ToUnicode" => Object::Reference(tounicode_id),
    });

    let resources = dictionary! {
        "Font" => Object::Dictionary(dictionary! {
            "F1" => Object::Reference(font_id),
        }),
    };
    (doc, resources)
}

#[test]
fn test_composite_font_resolves_through_references() {
    let (doc, resources) = composite_document();
    let (registry, warnings) = FontRegistry::from_resources(&doc, &resources);
    assert!(warnings.is_empty());

    let font = registry.get("F1").expect("font F1 should resolve");
    assert_eq!(font.kind(), FontKind::CidType2);
    assert_eq!(font.base_font(), "Inter");
}

#[test]
fn test_tounicode_is_authoritative() {
    let (doc, resources) = composite_document();
    let (registry, _) = FontRegistry::from_resources(&doc, &resources);
    let font = registry.get("F1").unwrap();

    let codes = font.decode_bytes(&[0x00, 0x48, 0x00, 0x49]);
    assert_eq!(codes.len(), 2);
    assert_eq!(codes[0].unicode, "H");
    assert_eq!(codes[1].unicode, "I"); // bfrange increment
    assert_eq!(codes[0].width, 722.0);
}

#[test]
fn test_ligature_destination_survives_decoding() {
    let (doc, resources) = composite_document();
    let (registry, _) = FontRegistry::from_resources(&doc, &resources);
    let font = registry.get("F1").unwrap();

    let codes = font.decode_bytes(&[0x00, 0xFB]);
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].unicode, "fi");
}

#[test]
fn test_unmapped_code_reads_as_replacement() {
    let (doc, resources) = composite_document();
    let (registry, _) = FontRegistry::from_resources(&doc, &resources);
    let font = registry.get("F1").unwrap();

    let codes = font.decode_bytes(&[0x30, 0x00]);
    assert_eq!(codes[0].unicode, REPLACEMENT);
}

#[test]
fn test_odd_trailing_byte_pads_with_zero() {
    let (doc, resources) = composite_document();
    let (registry, _) = FontRegistry::from_resources(&doc, &resources);
    let font = registry.get("F1").unwrap();

    // Three bytes against a two-byte codespace: the trailing byte decodes
    // as a one-byte code instead of being dropped
    let codes = font.decode_bytes(&[0x00, 0x48, 0x41]);
    assert_eq!(codes.len(), 2);
    assert_eq!(codes[0].code, 0x0048);
    assert_eq!(codes[1].bytes, vec![0x41]);
}
