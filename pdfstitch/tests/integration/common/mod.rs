//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use flate2::Crc;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Create a temporary output path for test results.
pub fn temp_output_path() -> tempfile::TempPath {
    tempfile::NamedTempFile::new()
        .expect("Failed to create temp file")
        .into_temp_path()
}

/// Build a PDF whose pages show `label-1`, `label-2`, ... and share an
/// inherited font resource and MediaBox.
pub fn sample_pdf(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let text = format!("BT /F1 12 Tf 72 720 Td ({label}-{n}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Save `doc` as `dir/name` and return the path.
pub fn save_fixture(dir: &Path, name: &str, mut doc: Document) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).expect("Failed to save fixture");
    path
}

/// Write a sample PDF with `pages` pages labelled `label`.
pub fn write_pdf(dir: &Path, label: &str, pages: usize) -> PathBuf {
    save_fixture(dir, &format!("{label}.pdf"), sample_pdf(label, pages))
}

/// Text shown on every page of a lopdf-readable file, in page order.
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Output should load with lopdf");
    doc.get_pages()
        .values()
        .map(|&page| {
            let content = doc.get_page_content(page).expect("Page content");
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').expect("Text operand") + 1;
            let end = text[start..].find(')').expect("Closing paren") + start;
            text[start..end].to_string()
        })
        .collect()
}

/// Assert that every xref row points at its own `n 0 obj` line and that
/// `startxref` points at the `xref` keyword.
pub fn assert_xref_consistent(bytes: &[u8]) {
    let offsets = xref_offsets(bytes);
    for (number, offset) in offsets.iter().enumerate().skip(1) {
        let header = format!("{number} 0 obj\n");
        assert!(
            bytes[*offset..].starts_with(header.as_bytes()),
            "xref entry {number} does not point at its object"
        );
    }
}

/// Byte offsets from the xref table, indexed by object number.
pub fn xref_offsets(bytes: &[u8]) -> Vec<usize> {
    let tail = rfind(bytes, b"startxref\n").expect("startxref keyword") + 10;
    let startxref: usize = ascii_number(&bytes[tail..]).expect("startxref offset");
    assert!(bytes[startxref..].starts_with(b"xref\n0 "), "startxref must point at xref");

    let count_at = startxref + 7;
    let count = ascii_number(&bytes[count_at..]).expect("xref subsection count");
    let table = count_at + find(&bytes[count_at..], b"\n").expect("subsection line") + 1;

    (0..count)
        .map(|row| {
            let entry = &bytes[table + row * 20..table + (row + 1) * 20];
            assert_eq!(entry[18..], *b" \n", "xref rows are 20 bytes");
            ascii_number(entry).expect("xref offset")
        })
        .collect()
}

/// Assert that each stream's `/Length` covers its data exactly.
pub fn assert_stream_lengths(bytes: &[u8]) {
    let mut offsets = xref_offsets(bytes);
    offsets.remove(0);
    let table = rfind(bytes, b"xref\n0 ").expect("xref");
    let ends: Vec<usize> = offsets.iter().skip(1).copied().chain([table]).collect();

    for (start, end) in offsets.iter().zip(ends) {
        let object = &bytes[*start..end];
        let Some(marker) = find(object, b"\nstream\n") else {
            continue;
        };
        let key = find(&object[..marker], b"/Length ").expect("direct /Length") + 8;
        let length = ascii_number(&object[key..marker]).expect("length value");
        let data_end = marker + 8 + length;
        assert!(
            object[data_end..].starts_with(b"\nendstream\nendobj\n"),
            "stream length mismatch in object at byte {start}"
        );
    }
}

fn ascii_number(bytes: &[u8]) -> Option<usize> {
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    std::str::from_utf8(&bytes[..digits]).ok()?.parse().ok()
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// A PDF 1.5 file in the layout modern producers emit: `plain` objects are
/// written directly, `packed` objects live in the flate-compressed object
/// stream `stream`, and an xref stream indexes everything.
///
/// `stream_extra` and `xref_extra` are appended to the object stream's and
/// the xref stream's dictionaries, after the generated entries, so they
/// override them.
pub fn packed_pdf(
    plain: &[(u32, &str)],
    stream: u32,
    packed: &[(u32, &str)],
    stream_extra: &str,
    xref_extra: &str,
) -> Vec<u8> {
    enum Row {
        Plain(usize),
        Packed(usize),
    }

    let mut out = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut rows = BTreeMap::new();
    for (number, body) in plain {
        rows.insert(*number, Row::Plain(out.len()));
        out.extend_from_slice(format!("{number} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    let mut header = String::new();
    let mut bodies = String::new();
    for (index, (number, body)) in packed.iter().enumerate() {
        rows.insert(*number, Row::Packed(index));
        header.push_str(&format!("{number} {} ", bodies.len()));
        bodies.push_str(body);
        bodies.push('\n');
    }
    let members = pdfstitch::filters::flate_encode(format!("{header}{bodies}").as_bytes()).unwrap();
    rows.insert(stream, Row::Plain(out.len()));
    out.extend_from_slice(
        format!(
            "{stream} 0 obj\n<< /Type /ObjStm /N {} /First {} /Filter /FlateDecode /Length {} {stream_extra} >>\nstream\n",
            packed.len(),
            header.len(),
            members.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(&members);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    let xref_number = rows.keys().next_back().copied().unwrap_or(0) + 1;
    let xref_offset = out.len();
    rows.insert(xref_number, Row::Plain(xref_offset));
    let mut table = Vec::new();
    for number in 0..=xref_number {
        match rows.get(&number) {
            Some(Row::Plain(offset)) => {
                table.push(1);
                table.extend_from_slice(&(*offset as u32).to_be_bytes());
                table.push(0);
            }
            Some(Row::Packed(index)) => {
                table.push(2);
                table.extend_from_slice(&stream.to_be_bytes());
                table.push(*index as u8);
            }
            None => table.extend_from_slice(&[0, 0, 0, 0, 0, 0xFF]),
        }
    }
    out.extend_from_slice(
        format!(
            "{xref_number} 0 obj\n<< /Type /XRef /Size {} /W [1 4 1] /Root 1 0 R /Length {} {xref_extra} >>\nstream\n",
            xref_number + 1,
            table.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(&table);
    out.extend_from_slice(format!("\nendstream\nendobj\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
    out
}

/// One-page [`packed_pdf`] whose catalog, page tree and page are packed and
/// whose content shows `label-1`.
pub fn packed_one_page_pdf(label: &str, stream_extra: &str, xref_extra: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({label}-1) Tj ET");
    let content_object = format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len());
    packed_pdf(
        &[(4, content_object.as_str())],
        5,
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>"),
            (3, "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>"),
            (6, "40"),
        ],
        stream_extra,
        xref_extra,
    )
}

/// A baseline JPEG header (SOI, SOF0, EOI) for a `width` x `height` RGB image.
pub fn jpeg_bytes(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 8];
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(3);
    for id in 1..=3 {
        data.extend_from_slice(&[id, 0x11, 0]);
    }
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// A PNG carrying an arbitrary IHDR and `raw` as its (unfiltered) IDAT data.
pub fn png_with_header(width: u32, height: u32, bit_depth: u8, color_type: u8, raw: &[u8]) -> Vec<u8> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png_chunk(&mut out, b"IHDR", &ihdr);
    png_chunk(&mut out, b"IDAT", &pdfstitch::filters::flate_encode(raw).unwrap());
    png_chunk(&mut out, b"IEND", &[]);
    out
}

/// An 8-bit RGBA PNG filled with a single colour.
pub fn rgba_png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

    let mut raw = Vec::new();
    for _ in 0..height {
        raw.push(0);
        for _ in 0..width {
            raw.extend_from_slice(&pixel);
        }
    }
    let idat = pdfstitch::filters::flate_encode(&raw).unwrap();

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png_chunk(&mut out, b"IHDR", &ihdr);
    png_chunk(&mut out, b"IDAT", &idat);
    png_chunk(&mut out, b"IEND", &[]);
    out
}

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pdf_page_count() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = write_pdf(temp_dir.path(), "fixture", 3);
        assert_eq!(page_texts(&path), vec!["fixture-1", "fixture-2", "fixture-3"]);
    }

    #[test]
    fn test_packed_pdf_loads_with_lopdf() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("packed.pdf");
        std::fs::write(&path, packed_one_page_pdf("packed", "", "")).unwrap();
        assert_eq!(page_texts(&path), vec!["packed-1"]);
    }

    #[test]
    fn test_jpeg_bytes_layout() {
        let data = jpeg_bytes(640, 480);
        assert_eq!(&data[7..11], &[0x01, 0xE0, 0x02, 0x80]);
        assert!(data.ends_with(&[0xFF, 0xD9]));
    }
}
