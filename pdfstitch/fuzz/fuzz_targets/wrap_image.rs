#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfstitch::config::PageLayout;
use pdfstitch::image::ImageWrapper;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let wrapper = ImageWrapper::new(PageLayout::ImageSize);
    if let Ok(doc) = wrapper.wrap_bytes(Path::new("fuzz.img"), data.to_vec()) {
        assert_eq!(doc.page_count(), 1);
        doc.serialize().unwrap();
    }
});
