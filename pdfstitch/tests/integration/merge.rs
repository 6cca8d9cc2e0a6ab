//! End-to-end merge tests.

use lopdf::Object;
use pdfstitch::config::{Config, Metadata, Operation};
use pdfstitch::merge::{Merger, SourceStage, merge_pdfs};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{
    assert_stream_lengths, assert_xref_consistent, page_texts, sample_pdf, save_fixture,
    write_pdf,
};

fn merge_config(inputs: Vec<PathBuf>, output: PathBuf) -> Config {
    let mut config = Config::new(Operation::Merge { inputs }, Some(output));
    config.quiet = true;
    config
}

#[test]
fn test_merge_preserves_source_and_page_order() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_pdf(temp_dir.path(), "first", 2);
    let second = write_pdf(temp_dir.path(), "second", 3);
    let output = temp_dir.path().join("merged.pdf");

    let (report, stats) = merge_pdfs(&merge_config(vec![first, second], output.clone())).unwrap();

    assert_eq!(report.total_pages, 5);
    assert_eq!(report.succeeded_count(), 2);
    assert!(stats.is_some());
    assert_eq!(
        page_texts(&output),
        vec!["first-1", "first-2", "second-1", "second-2", "second-3"]
    );
}

#[test]
fn test_merged_output_structure() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_pdf(temp_dir.path(), "a", 1);
    let b = write_pdf(temp_dir.path(), "b", 2);

    let result = Merger::new().merge(&[a, b]).unwrap();
    let serialized = result.document.serialize().unwrap();

    assert!(serialized.bytes.starts_with(b"%PDF-1.4\n"));
    assert!(serialized.bytes.ends_with(b"%%EOF\n"));
    assert_xref_consistent(&serialized.bytes);
    assert_stream_lengths(&serialized.bytes);
    assert_eq!(serialized.xref.len(), result.document.store().len() + 1);
}

#[test]
fn test_merged_pages_carry_inherited_attributes() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_pdf(temp_dir.path(), "inherit", 2);
    let output = temp_dir.path().join("merged.pdf");

    merge_pdfs(&merge_config(vec![input], output.clone())).unwrap();

    let doc = lopdf::Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);
    for page_id in pages.values() {
        let page = doc.get_dictionary(*page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let values: Vec<i64> = media_box.iter().map(|v| v.as_i64().unwrap()).collect();
        assert_eq!(values, vec![0, 0, 595, 842]);
        assert!(page.get(b"Resources").is_ok());
    }

    let catalog = doc.catalog().unwrap();
    let root = catalog.get(b"Pages").unwrap().as_reference().unwrap();
    let root = doc.get_dictionary(root).unwrap();
    assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 2);
}

#[test]
fn test_merge_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = vec![
        write_pdf(temp_dir.path(), "x", 2),
        write_pdf(temp_dir.path(), "y", 1),
    ];
    let merger = Merger::new().with_metadata(Metadata::new(Some("Same".into()), None, None, None));

    let once = merger.merge(&inputs).unwrap().document.serialize().unwrap();
    let twice = merger.merge(&inputs).unwrap().document.serialize().unwrap();
    assert_eq!(once.bytes, twice.bytes);
}

#[test]
fn test_merge_skips_unusable_source() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_pdf(temp_dir.path(), "good", 2);
    let junk = temp_dir.path().join("junk.pdf");
    std::fs::write(&junk, b"this is not a pdf").unwrap();
    let missing = temp_dir.path().join("missing.pdf");
    let tail = write_pdf(temp_dir.path(), "tail", 1);
    let output = temp_dir.path().join("merged.pdf");

    let (report, _) = merge_pdfs(&merge_config(
        vec![good, junk.clone(), missing.clone(), tail],
        output.clone(),
    ))
    .unwrap();

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.skipped_count(), 2);
    assert_eq!(report.skipped[0].path, junk);
    assert_eq!(report.skipped[0].stage, SourceStage::LocateStructure);
    assert_eq!(report.skipped[1].path, missing);
    assert_eq!(report.skipped[1].stage, SourceStage::Open);
    assert_eq!(page_texts(&output), vec!["good-1", "good-2", "tail-1"]);
}

#[test]
fn test_merge_recovers_damaged_xref() {
    let temp_dir = TempDir::new().unwrap();
    let intact = write_pdf(temp_dir.path(), "damaged", 2);
    let mut bytes = std::fs::read(&intact).unwrap();
    let tail = bytes
        .windows(10)
        .rposition(|w| w == b"startxref\n")
        .unwrap()
        + 10;
    let digits = bytes[tail..].iter().take_while(|b| b.is_ascii_digit()).count();
    bytes.splice(tail..tail + digits, b"1".iter().copied());
    let damaged = temp_dir.path().join("damaged-xref.pdf");
    std::fs::write(&damaged, bytes).unwrap();

    let output = temp_dir.path().join("out.pdf");
    let (report, _) = merge_pdfs(&merge_config(vec![damaged], output.clone())).unwrap();

    assert_eq!(report.total_pages, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(page_texts(&output), vec!["damaged-1", "damaged-2"]);
}

#[test]
fn test_merge_recovers_trailer_with_wrong_root() {
    let temp_dir = TempDir::new().unwrap();
    let intact = write_pdf(temp_dir.path(), "rooted", 2);
    let mut bytes = std::fs::read(&intact).unwrap();
    let trailer = bytes.windows(7).rposition(|w| w == b"trailer").unwrap();
    let key = trailer + bytes[trailer..].windows(5).position(|w| w == b"/Root").unwrap() + 5;
    let start = key + bytes[key..].iter().take_while(|b| b.is_ascii_whitespace()).count();
    let digits = bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();
    bytes.splice(start..start + digits, b"999".iter().copied());
    let damaged = temp_dir.path().join("wrong-root.pdf");
    std::fs::write(&damaged, bytes).unwrap();

    let result = Merger::new().merge(&[damaged]).unwrap();

    assert_eq!(result.report.total_pages, 2);
    assert!(result.report.succeeded[0].recovered);
}

#[test]
fn test_dangling_reference_becomes_null() {
    let temp_dir = TempDir::new().unwrap();
    let mut doc = sample_pdf("dangling", 1);
    let page_id = *doc.get_pages().values().next().unwrap();
    let gone = doc.add_object(lopdf::dictionary! { "Type" => "Annot" });
    doc.get_dictionary_mut(page_id)
        .unwrap()
        .set("Annots", vec![Object::Reference(gone)]);
    doc.objects.remove(&gone);
    let input = save_fixture(temp_dir.path(), "dangling.pdf", doc);
    let output = temp_dir.path().join("merged.pdf");

    let (report, _) = merge_pdfs(&merge_config(vec![input], output.clone())).unwrap();
    assert_eq!(report.total_pages, 1);

    let merged = lopdf::Document::load(&output).unwrap();
    let page_id = *merged.get_pages().values().next().unwrap();
    let annots = merged
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap();
    assert!(matches!(annots.as_slice(), [Object::Null]));
}

#[test]
fn test_metadata_written_to_info() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_pdf(temp_dir.path(), "meta", 1);
    let output = temp_dir.path().join("merged.pdf");
    let mut config = merge_config(vec![input], output.clone());
    config.metadata = Metadata::new(Some("Collected".into()), Some("Ann".into()), None, None);

    merge_pdfs(&config).unwrap();

    let doc = lopdf::Document::load(&output).unwrap();
    let info = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info).unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Collected");
    assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Ann");
}

#[test]
fn test_merged_output_can_be_merged_again() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.pdf");
    merge_pdfs(&merge_config(
        vec![write_pdf(temp_dir.path(), "p", 2)],
        first.clone(),
    ))
    .unwrap();

    let second = temp_dir.path().join("second.pdf");
    let (report, _) = merge_pdfs(&merge_config(
        vec![first.clone(), first],
        second.clone(),
    ))
    .unwrap();

    assert_eq!(report.total_pages, 4);
    assert_eq!(page_texts(&second), vec!["p-1", "p-2", "p-1", "p-2"]);
}
