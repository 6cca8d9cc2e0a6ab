//! Byte-level checks on a source before lopdf decodes it, and the
//! cross-reference rebuild used when its index is unusable.

use std::collections::BTreeMap;

use crate::object::ObjectNumber;

/// Highest object number a conforming file may use.
const MAX_OBJECT_NUMBER: u64 = 8_388_607;

/// Ceilings for the integers that size buffers while decoding structure.
const LIMITS: [(&[u8], u64); 6] = [
    (b"/Columns", 1 << 20),
    (b"/Colors", 32),
    (b"/BitsPerComponent", 16),
    (b"/Size", MAX_OBJECT_NUMBER + 1),
    (b"/N", MAX_OBJECT_NUMBER),
    (b"/Index", MAX_OBJECT_NUMBER + 1),
];

/// Field widths of an xref stream row. Checked only inside xref stream
/// dictionaries, since fonts use `/W` for glyph widths.
const MAX_FIELD_WIDTH: u64 = 8;

/// Whether a `%PDF-` marker appears near the start of `data`.
pub(crate) fn has_header(data: &[u8]) -> bool {
    find(&data[..data.len().min(1024)], b"%PDF-").is_some()
}

/// Whether any dictionary carries an `/Encrypt` entry.
pub(crate) fn declares_encryption(data: &[u8]) -> bool {
    occurrences(data, b"/Encrypt").any(|end| {
        let start = skip_whitespace(data, end);
        start > end && matches!(data.get(start), Some(b'0'..=b'9' | b'<'))
    })
}

/// Reject integers that would make stream or index decoding allocate
/// without bound. Returns a description of the first offending entry.
pub(crate) fn check_limits(data: &[u8]) -> Result<(), String> {
    for (key, max) in LIMITS {
        check_entries(data, key, max)?;
    }
    for end in occurrences(data, b"/XRef") {
        let start = rfind(&data[..end], b"obj").unwrap_or(0);
        let stop = find(&data[end..], b"stream").map_or(data.len(), |at| end + at);
        check_entries(&data[start..stop], b"/W", MAX_FIELD_WIDTH)?;
    }
    Ok(())
}

/// Check every integer following `key`, or inside the array following it.
fn check_entries(data: &[u8], key: &[u8], max: u64) -> Result<(), String> {
    let name = String::from_utf8_lossy(key);
    for end in occurrences(data, key) {
        let mut at = skip_whitespace(data, end);
        let in_array = data.get(at) == Some(&b'[');
        if in_array {
            at += 1;
        }
        loop {
            at = skip_whitespace(data, at);
            match data.get(at) {
                Some(b'-') => return Err(format!("{name} is negative")),
                Some(b'0'..=b'9') => {
                    let (value, next) = read_unsigned(data, at);
                    if value > max {
                        return Err(format!(
                            "{name} value {} exceeds {max}",
                            String::from_utf8_lossy(&data[at..next])
                        ));
                    }
                    at = next;
                }
                _ => break,
            }
            if !in_array {
                break;
            }
        }
    }
    Ok(())
}

/// Append a classic cross-reference section indexing every `N G obj`
/// header found in `data`, with a trailer pointing at the catalog.
///
/// Objects stored inside object streams are not found by the scan.
/// Returns `None` when no catalog can be identified.
pub(crate) fn rebuild_cross_reference(data: &[u8]) -> Option<Vec<u8>> {
    let objects = scan_object_headers(data);
    let root = last_reference(data, b"/Root")
        .filter(|(number, _)| objects.contains_key(number))
        .or_else(|| find_catalog(data, &objects))?;
    let info = last_reference(data, b"/Info").filter(|(number, _)| objects.contains_key(number));
    let size = objects.keys().next_back().map_or(1, |last| last + 1);

    let mut out = data.to_vec();
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    let startxref = out.len();
    out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");

    let numbers: Vec<ObjectNumber> = objects.keys().copied().collect();
    for run in numbers.chunk_by(|a, b| a + 1 == *b) {
        out.extend_from_slice(format!("{} {}\n", run[0], run.len()).as_bytes());
        for number in run {
            let (offset, generation) = objects[number];
            out.extend_from_slice(format!("{offset:010} {generation:05} n \n").as_bytes());
        }
    }

    let mut trailer = format!("<< /Size {size} /Root {} {} R", root.0, root.1);
    if let Some((number, generation)) = info {
        trailer.push_str(&format!(" /Info {number} {generation} R"));
    }
    out.extend_from_slice(format!("trailer\n{trailer} >>\nstartxref\n{startxref}\n%%EOF\n").as_bytes());
    Some(out)
}

/// Offset and generation of every object header; later definitions win.
fn scan_object_headers(data: &[u8]) -> BTreeMap<ObjectNumber, (usize, u16)> {
    let mut objects = BTreeMap::new();
    for end in occurrences(data, b"obj") {
        let keyword = end - 3;
        let Some((generation, number_end)) = number_before(data, keyword) else {
            continue;
        };
        let Some((number, start)) = number_before(data, number_end) else {
            continue;
        };
        let (Ok(number), Ok(generation)) = (ObjectNumber::try_from(number), u16::try_from(generation)) else {
            continue;
        };
        if u64::from(number) <= MAX_OBJECT_NUMBER && number > 0 {
            objects.insert(number, (start, generation));
        }
    }
    objects
}

/// Parse `digits whitespace` ending right before `end`, returning the value
/// and the offset where the digits start. The digits must be preceded by
/// whitespace, a delimiter or the start of the file.
fn number_before(data: &[u8], end: usize) -> Option<(u64, usize)> {
    let mut digits_end = end;
    while digits_end > 0 && is_whitespace(data[digits_end - 1]) {
        digits_end -= 1;
    }
    if digits_end == end {
        return None;
    }
    let mut start = digits_end;
    while start > 0 && data[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == digits_end || digits_end - start > 10 {
        return None;
    }
    if start > 0 && !(is_whitespace(data[start - 1]) || is_delimiter(data[start - 1])) {
        return None;
    }
    Some((read_unsigned(data, start).0, start))
}

/// Last `key N G R` in `data`.
fn last_reference(data: &[u8], key: &[u8]) -> Option<(ObjectNumber, u16)> {
    let ends: Vec<usize> = occurrences(data, key).collect();
    ends.into_iter().rev().find_map(|end| {
        let at = skip_whitespace(data, end);
        let (number, after_number) = digits_at(data, at)?;
        let at = skip_whitespace(data, after_number);
        let (generation, after_generation) = digits_at(data, at)?;
        let at = skip_whitespace(data, after_generation);
        (data.get(at) == Some(&b'R')).then_some(())?;
        Some((ObjectNumber::try_from(number).ok()?, u16::try_from(generation).ok()?))
    })
}

/// The last-defined object whose body names `/Catalog`.
fn find_catalog(
    data: &[u8],
    objects: &BTreeMap<ObjectNumber, (usize, u16)>,
) -> Option<(ObjectNumber, u16)> {
    objects
        .iter()
        .filter(|(_, (offset, _))| {
            let rest = &data[*offset..];
            let body = &rest[..find(rest, b"endobj").unwrap_or(rest.len())];
            occurrences(body, b"/Catalog").next().is_some()
        })
        .max_by_key(|(_, (offset, _))| *offset)
        .map(|(number, (_, generation))| (*number, *generation))
}

/// End offsets of each whole-token occurrence of `needle`.
fn occurrences<'a>(data: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    data.windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(move |(start, _)| start + needle.len())
        .filter(move |end| data.get(*end).is_none_or(|b| is_whitespace(*b) || is_delimiter(*b)))
}

fn digits_at(data: &[u8], at: usize) -> Option<(u64, usize)> {
    data.get(at)
        .filter(|b| b.is_ascii_digit())
        .map(|_| read_unsigned(data, at))
}

/// Read a run of ASCII digits, saturating on overflow.
fn read_unsigned(data: &[u8], start: usize) -> (u64, usize) {
    let mut value: u64 = 0;
    let mut at = start;
    while let Some(digit) = data.get(at).filter(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(u64::from(digit - b'0'));
        at += 1;
    }
    (value, at)
}

fn skip_whitespace(data: &[u8], mut at: usize) -> usize {
    while data.get(at).is_some_and(|b| is_whitespace(*b)) {
        at += 1;
    }
    at
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\0' | b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
