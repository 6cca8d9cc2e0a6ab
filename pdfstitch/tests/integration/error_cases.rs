//! Integration tests for error handling and edge cases.

use lopdf::dictionary;
use pdfstitch::config::{Config, Operation, PageLayout};
use pdfstitch::error::PdfStitchError;
use pdfstitch::image::wrap_image_file;
use pdfstitch::merge::{Merger, SourceStage, merge_pdfs};
use rstest::rstest;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{
    packed_one_page_pdf, page_texts, png_with_header, sample_pdf, save_fixture, temp_output_path,
    write_pdf,
};

fn merge_config(inputs: Vec<PathBuf>, output: PathBuf) -> Config {
    let mut config = Config::new(Operation::Merge { inputs }, Some(output));
    config.quiet = true;
    config
}

#[test]
fn test_error_all_inputs_missing() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.pdf");
    let inputs = vec![
        temp_dir.path().join("one.pdf"),
        temp_dir.path().join("two.pdf"),
    ];

    let err = merge_pdfs(&merge_config(inputs, output.clone())).unwrap_err();

    assert!(matches!(err, PdfStitchError::NoInputsSucceeded { skipped: 2 }));
    assert!(!output.exists(), "No output should be written");
}

#[test]
fn test_error_empty_input_list() {
    let output = temp_output_path();
    let config = merge_config(vec![], output.to_path_buf());

    assert!(config.validate().is_err());
    assert!(matches!(
        Merger::new().merge(&[]),
        Err(PdfStitchError::NoFilesToMerge)
    ));
}

#[test]
fn test_encrypted_source_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let mut locked = sample_pdf("locked", 2);
    let encrypt = locked.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
    });
    locked.trailer.set("Encrypt", encrypt);
    let locked = save_fixture(temp_dir.path(), "locked.pdf", locked);
    let open = write_pdf(temp_dir.path(), "open", 1);
    let output = temp_dir.path().join("out.pdf");

    let (report, _) = merge_pdfs(&merge_config(vec![locked.clone(), open], output.clone())).unwrap();

    assert_eq!(report.total_pages, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, locked);
    assert_eq!(report.skipped[0].stage, SourceStage::LocateStructure);
    assert!(report.skipped[0].error.contains("encrypted"));
    assert_eq!(page_texts(&output), vec!["open-1"]);
}

#[test]
fn test_truncated_source_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let whole = write_pdf(temp_dir.path(), "whole", 3);
    let bytes = std::fs::read(&whole).unwrap();
    let truncated = temp_dir.path().join("truncated.pdf");
    std::fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

    let result = Merger::new().merge(&[truncated, whole]).unwrap();

    assert_eq!(result.report.skipped_count(), 1);
    assert_eq!(result.report.total_pages, 3);
}

#[rstest]
#[case::oversized_predictor("/DecodeParms << /Predictor 12 /Columns 4000000000000 >>", "", "/Columns")]
#[case::huge_member_count("/N 4000000000", "", "/N")]
#[case::index_out_of_range("", "/Index [4294967295 2]", "/Index")]
#[case::oversized_field_width("", "/W [1 4000 1]", "/W")]
fn test_hostile_stream_structure_is_skipped(
    #[case] stream_extra: &str,
    #[case] xref_extra: &str,
    #[case] key: &str,
) {
    let temp_dir = TempDir::new().unwrap();
    let first = write_pdf(temp_dir.path(), "first", 1);
    let hostile = temp_dir.path().join("hostile.pdf");
    std::fs::write(&hostile, packed_one_page_pdf("hostile", stream_extra, xref_extra)).unwrap();
    let last = write_pdf(temp_dir.path(), "last", 2);
    let output = temp_dir.path().join("out.pdf");

    let (report, _) =
        merge_pdfs(&merge_config(vec![first, hostile.clone(), last], output.clone())).unwrap();

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, hostile);
    assert_eq!(report.skipped[0].stage, SourceStage::LocateStructure);
    assert!(report.skipped[0].error.contains(key), "{}", report.skipped[0].error);
    assert_eq!(page_texts(&output), vec!["first-1", "last-1", "last-2"]);
}

#[test]
fn test_object_stream_packed_source_merges() {
    let temp_dir = TempDir::new().unwrap();
    let packed = temp_dir.path().join("packed.pdf");
    std::fs::write(&packed, packed_one_page_pdf("packed", "", "")).unwrap();
    let good = write_pdf(temp_dir.path(), "good", 1);
    let output = temp_dir.path().join("out.pdf");

    let (report, _) = merge_pdfs(&merge_config(vec![packed, good], output.clone())).unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(page_texts(&output), vec!["packed-1", "good-1"]);
}

#[test]
fn test_self_referencing_stream_length_does_not_abort() {
    let temp_dir = TempDir::new().unwrap();
    // Object 6, the /Length of object stream 5, is itself stored in 5.
    let cyclic = temp_dir.path().join("cyclic.pdf");
    std::fs::write(&cyclic, packed_one_page_pdf("cyclic", "/Length 6 0 R", "")).unwrap();
    let good = write_pdf(temp_dir.path(), "good", 2);
    let output = temp_dir.path().join("out.pdf");

    let (report, _) = merge_pdfs(&merge_config(vec![cyclic, good], output.clone())).unwrap();

    assert_eq!(report.succeeded.len() + report.skipped.len(), 2);
    let texts = page_texts(&output);
    assert_eq!(texts[texts.len() - 2..], ["good-1", "good-2"]);
    // The payload can still be delimited by its endstream marker, in which
    // case the source merges instead of being skipped.
    assert!(texts.len() == 2 || texts == ["cyclic-1", "good-1", "good-2"]);
}

#[test]
fn test_directory_input_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = write_pdf(temp_dir.path(), "real", 1);
    let subdir = temp_dir.path().join("folder.pdf");
    std::fs::create_dir(&subdir).unwrap();

    let result = Merger::new().merge(&[subdir, pdf]).unwrap();

    assert_eq!(result.report.skipped[0].stage, SourceStage::Open);
    assert_eq!(result.report.total_pages, 1);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_pdf(temp_dir.path(), "plan", 4);
    let output = temp_dir.path().join("out.pdf");
    let mut config = merge_config(vec![input, temp_dir.path().join("gone.pdf")], output.clone());
    config.dry_run = true;

    let (report, stats) = merge_pdfs(&config).unwrap();

    assert!(report.dry_run);
    assert!(stats.is_none());
    assert_eq!(report.total_pages, 4);
    assert_eq!(report.skipped_count(), 1);
    assert!(!output.exists());
}

#[test]
fn test_write_failure_leaves_nothing_behind() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_pdf(temp_dir.path(), "src", 1);
    let output = temp_dir.path().join("no-such-dir").join("out.pdf");

    let err = merge_pdfs(&merge_config(vec![input], output.clone())).unwrap_err();

    assert!(matches!(err, PdfStitchError::WriteFailure { .. }));
    assert!(!output.exists());
}

#[test]
fn test_failed_merge_keeps_existing_output() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.pdf");
    std::fs::write(&output, b"previous contents").unwrap();

    let result = merge_pdfs(&merge_config(vec![temp_dir.path().join("gone.pdf")], output.clone()));

    assert!(result.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous contents");
}

#[test]
fn test_unsupported_image_format() {
    let temp_dir = TempDir::new().unwrap();
    let gif = temp_dir.path().join("anim.gif");
    std::fs::write(&gif, b"GIF89a\x01\x00\x01\x00").unwrap();

    let err = wrap_image_file(&gif, PageLayout::ImageSize).unwrap_err();
    assert!(matches!(err, PdfStitchError::UnsupportedImageFormat { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_truncated_jpeg_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let jpeg = temp_dir.path().join("cut.jpg");
    std::fs::write(&jpeg, [0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 8, 0x01]).unwrap();

    let err = wrap_image_file(&jpeg, PageLayout::ImageSize).unwrap_err();
    assert!(matches!(err, PdfStitchError::UnsupportedImageFormat { .. }));
}

#[test]
fn test_missing_image() {
    let temp_dir = TempDir::new().unwrap();
    let err = wrap_image_file(&temp_dir.path().join("nope.png"), PageLayout::ImageSize).unwrap_err();
    assert!(matches!(err, PdfStitchError::FileNotFound { .. }));
}

#[test]
fn test_png_header_with_absurd_dimensions_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let png = temp_dir.path().join("wide.png");
    std::fs::write(&png, png_with_header(0x7FFF_FFFF, 1, 16, 6, &[0; 16])).unwrap();

    let err = wrap_image_file(&png, PageLayout::ImageSize).unwrap_err();
    assert!(matches!(err, PdfStitchError::UnsupportedImageFormat { .. }));
    assert_eq!(err.exit_code(), 3);
}
