#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfstitch::document::Document;
use pdfstitch::io::SourceDocument;
use pdfstitch::merge::pages::{read_page_tree, stage_objects};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = SourceDocument::parse(Path::new("fuzz.pdf"), data.to_vec()) else {
        return;
    };
    let Ok(tree) = read_page_tree(&source) else {
        return;
    };
    let Ok(staged) = stage_objects(&source, tree) else {
        return;
    };

    // Whatever survives staging must register and serialize cleanly.
    let pages = staged.page_count();
    let mut doc = Document::new();
    staged.register_into(&mut doc).unwrap();
    assert_eq!(doc.page_count(), pages);
    doc.serialize().unwrap();
});
