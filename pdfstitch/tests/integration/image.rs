//! End-to-end image wrapping tests.

use lopdf::{Dictionary, Document as LoDocument};
use pdfstitch::config::{Metadata, PageLayout, PageSize};
use pdfstitch::image::{ImageWrapper, wrap_image_file};
use pdfstitch::io::PdfWriter;
use pdfstitch::merge::Merger;
use std::path::Path;
use tempfile::TempDir;

use crate::common::{
    assert_stream_lengths, assert_xref_consistent, jpeg_bytes, rgba_png, write_pdf,
};

fn media_box(doc: &LoDocument) -> Vec<f64> {
    let page_id = *doc.get_pages().values().next().unwrap();
    doc.get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_float().map(f64::from).or_else(|_| v.as_i64().map(|n| n as f64)).unwrap())
        .collect()
}

fn image_xobject(doc: &LoDocument) -> (Dictionary, Vec<u8>) {
    let page_id = *doc.get_pages().values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    (stream.dict.clone(), stream.content.clone())
}

fn wrap_and_save(dir: &Path, name: &str, data: &[u8], layout: PageLayout) -> LoDocument {
    let input = dir.join(name);
    std::fs::write(&input, data).unwrap();
    let output = dir.join(format!("{name}.pdf"));

    let doc = wrap_image_file(&input, layout).unwrap();
    PdfWriter::new().save(&doc, &output).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_xref_consistent(&bytes);
    assert_stream_lengths(&bytes);
    LoDocument::load(&output).unwrap()
}

#[test]
fn test_jpeg_page_matches_image_size() {
    let temp_dir = TempDir::new().unwrap();
    let jpeg = jpeg_bytes(640, 480);

    let doc = wrap_and_save(temp_dir.path(), "photo.jpg", &jpeg, PageLayout::ImageSize);

    assert_eq!(doc.get_pages().len(), 1);
    assert_eq!(media_box(&doc), vec![0.0, 0.0, 640.0, 480.0]);

    let (dict, content) = image_xobject(&doc);
    assert_eq!(dict.get(b"Width").unwrap().as_i64().unwrap(), 640);
    assert_eq!(dict.get(b"Height").unwrap().as_i64().unwrap(), 480);
    assert_eq!(dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
    assert_eq!(content, jpeg);
}

#[test]
fn test_png_with_alpha_gets_soft_mask() {
    let temp_dir = TempDir::new().unwrap();
    let png = rgba_png(3, 2, [10, 20, 30, 128]);

    let doc = wrap_and_save(temp_dir.path(), "icon.png", &png, PageLayout::ImageSize);

    assert_eq!(media_box(&doc), vec![0.0, 0.0, 3.0, 2.0]);
    let (dict, _) = image_xobject(&doc);
    assert_eq!(dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");

    let smask_id = dict.get(b"SMask").unwrap().as_reference().unwrap();
    let smask = doc.get_object(smask_id).unwrap().as_stream().unwrap();
    assert_eq!(smask.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
    assert_eq!(smask.decompressed_content().unwrap(), vec![128; 6]);
}

#[test]
fn test_fixed_page_size_centres_image() {
    let temp_dir = TempDir::new().unwrap();
    let layout = PageLayout::Fixed {
        size: PageSize::A4,
        margin: 36.0,
    };

    let doc = wrap_and_save(temp_dir.path(), "wide.jpg", &jpeg_bytes(1046, 523), layout);

    assert_eq!(media_box(&doc), vec![0.0, 0.0, 595.0, 842.0]);
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
    assert!(content.contains("523 0 0 261.5 36 290.25 cm"), "got {content}");
    assert!(content.contains("/Im1 Do"));
}

#[test]
fn test_wrapped_image_with_metadata_merges_with_pdfs() {
    let temp_dir = TempDir::new().unwrap();
    let image_path = temp_dir.path().join("cover.jpg");
    std::fs::write(&image_path, jpeg_bytes(200, 100)).unwrap();
    let cover = temp_dir.path().join("cover.pdf");
    let doc = ImageWrapper::new(PageLayout::ImageSize)
        .with_metadata(Metadata::new(Some("Cover".into()), None, None, None))
        .wrap_file(&image_path)
        .unwrap();
    PdfWriter::new().save(&doc, &cover).unwrap();

    let body = write_pdf(temp_dir.path(), "body", 2);
    let result = Merger::new().merge(&[cover, body]).unwrap();

    assert_eq!(result.report.total_pages, 3);
    assert_eq!(result.report.succeeded[0].pages, 1);
    let serialized = result.document.serialize().unwrap();
    assert_xref_consistent(&serialized.bytes);
    assert_stream_lengths(&serialized.bytes);
}

#[test]
fn test_image_output_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("same.png");
    std::fs::write(&input, rgba_png(4, 4, [1, 2, 3, 255])).unwrap();

    let wrapper = ImageWrapper::new(PageLayout::ImageSize);
    let once = wrapper.wrap_file(&input).unwrap().serialize().unwrap();
    let twice = wrapper.wrap_file(&input).unwrap().serialize().unwrap();
    assert_eq!(once.bytes, twice.bytes);
    assert!(!once.xref[0].in_use);
}
