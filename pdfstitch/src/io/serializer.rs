//! Byte-exact PDF 1.4 serialization.
//!
//! Objects are written in ascending number order while a counting writer
//! tracks the cursor, so every xref entry records the offset its object was
//! actually written at.

use std::io::{self, Write};

use crate::error::Result;
use crate::object::{
    Dictionary, IndirectObject, Name, ObjectBody, ObjectNumber, ObjectStore, StringFormat, Value,
};

/// File header: version line plus a comment of high-bit bytes.
pub const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// One row of the cross-reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    /// Offset of the `n g obj` line from the start of the file.
    pub byte_offset: u64,
    /// Object number.
    pub object_number: ObjectNumber,
    /// Generation number.
    pub generation: u16,
    /// `n` (true) or `f` (false).
    pub in_use: bool,
}

impl XrefEntry {
    fn free_head() -> Self {
        Self {
            byte_offset: 0,
            object_number: 0,
            generation: 65535,
            in_use: false,
        }
    }
}

/// A fully serialized document.
#[derive(Debug, Clone)]
pub struct SerializedDocument {
    /// The complete file.
    pub bytes: Vec<u8>,
    /// Xref entries, starting with the free entry for object 0.
    pub xref: Vec<XrefEntry>,
    /// Offset of the `xref` keyword.
    pub startxref: u64,
}

/// Serialize `store` into memory.
pub fn serialize(
    store: &ObjectStore,
    root: ObjectNumber,
    info: Option<ObjectNumber>,
) -> Result<SerializedDocument> {
    let mut bytes = Vec::new();
    let (xref, startxref) = write_to(&mut bytes, store, root, info)?;
    Ok(SerializedDocument {
        bytes,
        xref,
        startxref,
    })
}

/// Serialize `store` into `writer`, returning the xref entries and the
/// `startxref` offset.
pub fn write_to<W: Write>(
    writer: W,
    store: &ObjectStore,
    root: ObjectNumber,
    info: Option<ObjectNumber>,
) -> io::Result<(Vec<XrefEntry>, u64)> {
    let mut out = CountingWriter::new(writer);
    out.write_all(HEADER)?;

    let mut xref = Vec::with_capacity(store.len() + 1);
    xref.push(XrefEntry::free_head());
    for object in store.iter() {
        xref.push(XrefEntry {
            byte_offset: out.position(),
            object_number: object.number,
            generation: object.generation,
            in_use: true,
        });
        write_object(&mut out, object)?;
    }

    let startxref = out.position();
    writeln!(out, "xref\n0 {}", xref.len())?;
    for entry in &xref {
        let kind = if entry.in_use { 'n' } else { 'f' };
        writeln!(out, "{:010} {:05} {kind} ", entry.byte_offset, entry.generation)?;
    }

    write!(out, "trailer\n<< /Size {} /Root {root} 0 R", xref.len())?;
    if let Some(info) = info {
        write!(out, " /Info {info} 0 R")?;
    }
    writeln!(out, " >>\nstartxref\n{startxref}\n%%EOF")?;
    out.flush()?;

    Ok((xref, startxref))
}

fn write_object<W: Write>(out: &mut W, object: &IndirectObject) -> io::Result<()> {
    writeln!(out, "{} {} obj", object.number, object.generation)?;
    match &object.body {
        ObjectBody::Dictionary(dict) => write_dictionary(out, dict)?,
        ObjectBody::Array(items) => write_array(out, items)?,
        ObjectBody::Stream(stream) => {
            write_dictionary(out, stream.dict())?;
            out.write_all(b"\nstream\n")?;
            out.write_all(stream.content())?;
            out.write_all(b"\nendstream")?;
        }
        ObjectBody::Reference(number) => write!(out, "{number} 0 R")?,
        ObjectBody::Primitive(value) => write_value(out, value)?,
    }
    out.write_all(b"\nendobj\n")
}

/// Write a direct value in PDF syntax.
pub fn write_value<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => out.write_all(b"null"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::Integer(n) => write!(out, "{n}"),
        Value::Real(r) => out.write_all(format_real(*r).as_bytes()),
        Value::String(bytes, StringFormat::Literal) => write_literal_string(out, bytes),
        Value::String(bytes, StringFormat::Hex) => {
            out.write_all(b"<")?;
            for byte in bytes {
                write!(out, "{byte:02X}")?;
            }
            out.write_all(b">")
        }
        Value::Name(name) => write_name(out, name),
        Value::Array(items) => write_array(out, items),
        Value::Dictionary(dict) => write_dictionary(out, dict),
        Value::Reference(number) => write!(out, "{number} 0 R"),
    }
}

fn write_array<W: Write>(out: &mut W, items: &[Value]) -> io::Result<()> {
    out.write_all(b"[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        write_value(out, item)?;
    }
    out.write_all(b"]")
}

fn write_dictionary<W: Write>(out: &mut W, dict: &Dictionary) -> io::Result<()> {
    out.write_all(b"<<")?;
    for (key, value) in dict.iter() {
        out.write_all(b" ")?;
        write_name(out, key)?;
        out.write_all(b" ")?;
        write_value(out, value)?;
    }
    out.write_all(b" >>")
}

fn write_name<W: Write>(out: &mut W, name: &Name) -> io::Result<()> {
    out.write_all(b"/")?;
    for &byte in name.as_bytes() {
        if is_regular_name_byte(byte) {
            out.write_all(&[byte])?;
        } else {
            write!(out, "#{byte:02X}")?;
        }
    }
    Ok(())
}

fn is_regular_name_byte(byte: u8) -> bool {
    (0x21..=0x7E).contains(&byte) && !b"#/%()<>[]{}".contains(&byte)
}

fn write_literal_string<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    out.write_all(b"(")?;
    for &byte in bytes {
        match byte {
            b'\\' => out.write_all(b"\\\\")?,
            b'(' => out.write_all(b"\\(")?,
            b')' => out.write_all(b"\\)")?,
            b'\r' => out.write_all(b"\\r")?,
            other => out.write_all(&[other])?,
        }
    }
    out.write_all(b")")
}

/// Format a real without exponent or trailing zeros.
pub fn format_real(r: f64) -> String {
    if !r.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{r:.6}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Writer adapter tracking how many bytes passed through it.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    fn position(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
