//! Loading source PDFs for merging.
//!
//! Opening a source is split in two steps that fail differently: [`read_source`]
//! only touches the filesystem, [`SourceDocument::parse`] decodes the bytes
//! with lopdf. Objects are handed out converted into this crate's object
//! model through [`SourceDocument::object`].
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::reader::{SourceDocument, read_source};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let path = Path::new("input.pdf");
//! let mut source = SourceDocument::parse(path, read_source(path)?)?;
//! let catalog = source.catalog()?;
//! println!("Catalog is object {catalog}");
//! # Ok(())
//! # }
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::Object;
use tracing::{debug, warn};

use crate::error::{PdfStitchError, Result};
use crate::io::scan;
use crate::object::{Dictionary, Name, ObjectBody, ObjectNumber, Stream, StringFormat, Value};

/// Reference chains longer than this are treated as malformed.
const MAX_REFERENCE_CHAIN: usize = 32;

/// Read a source file into memory.
///
/// # Errors
///
/// `FileNotFound`, `NotAFile` or `FileNotAccessible`.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PdfStitchError::file_not_found(path.to_path_buf()));
        }
        Err(source) => {
            return Err(PdfStitchError::FileNotAccessible {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if !metadata.is_file() {
        return Err(PdfStitchError::not_a_file(path.to_path_buf()));
    }

    std::fs::read(path).map_err(|source| PdfStitchError::FileNotAccessible {
        path: path.to_path_buf(),
        source,
    })
}

/// A decoded source PDF.
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    len: usize,
    document: lopdf::Document,
    trailer: Dictionary,
    recovered: bool,
}

impl SourceDocument {
    /// Decode `data`.
    ///
    /// A cross-reference index that lopdf cannot use, or whose `/Root` does
    /// not lead to a catalog, is rebuilt by scanning for object headers.
    ///
    /// # Errors
    ///
    /// - `MalformedSource` if the bytes are not a PDF, declare structure too
    ///   large to decode, or have no catalog
    /// - `EncryptedSource` if the document is encrypted
    pub fn parse(path: &Path, data: Vec<u8>) -> Result<Self> {
        let malformed = |details: String| PdfStitchError::malformed_source(path.to_path_buf(), details);

        if !scan::has_header(&data) {
            return Err(malformed("missing %PDF- header".to_string()));
        }
        if scan::declares_encryption(&data) {
            return Err(PdfStitchError::EncryptedSource {
                path: path.to_path_buf(),
            });
        }
        scan::check_limits(&data).map_err(malformed)?;

        let (document, recovered) = match load(&data) {
            Ok(document) if has_catalog(&document) => (document, false),
            outcome => {
                let reason = match outcome {
                    Ok(_) => "trailer /Root does not lead to a catalog".to_string(),
                    Err(e) => e,
                };
                warn!("{}: {reason}, scanning for objects", path.display());
                let rebuilt = scan::rebuild_cross_reference(&data)
                    .ok_or_else(|| malformed(format!("{reason}; no catalog found by scanning")))?;
                let document = load(&rebuilt).map_err(|e| malformed(format!("{reason}; {e}")))?;
                if !has_catalog(&document) {
                    return Err(malformed(reason));
                }
                (document, true)
            }
        };

        if document.is_encrypted() {
            return Err(PdfStitchError::EncryptedSource {
                path: path.to_path_buf(),
            });
        }

        debug!(
            "{}: {} objects loaded{}",
            path.display(),
            document.objects.len(),
            if recovered { " (recovered)" } else { "" }
        );

        Ok(Self {
            path: path.to_path_buf(),
            len: data.len(),
            trailer: convert_dictionary(&document.trailer),
            document,
            recovered,
        })
    }

    /// Path the source was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the source in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the source file was empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Number of loaded objects.
    pub fn object_count(&self) -> usize {
        self.document.objects.len()
    }

    /// Whether the index was rebuilt by scanning.
    pub fn was_recovered(&self) -> bool {
        self.recovered
    }

    /// Object number of the document catalog.
    pub fn catalog(&self) -> Result<ObjectNumber> {
        self.trailer
            .get_reference(b"Root")
            .ok_or_else(|| self.malformed("trailer has no /Root reference"))
    }

    /// Build a `MalformedSource` error for this source.
    pub fn malformed(&self, details: impl Into<String>) -> PdfStitchError {
        PdfStitchError::malformed_source(self.path.clone(), details)
    }

    /// Load an object. `None` means the source does not define it.
    pub fn object(&self, number: ObjectNumber) -> Option<ObjectBody> {
        Some(match self.lookup(number)? {
            Object::Stream(stream) => {
                ObjectBody::Stream(Stream::new(convert_dictionary(&stream.dict), stream.content.clone()))
            }
            other => ObjectBody::from(convert(other)),
        })
    }

    /// Load an object that must be a dictionary (or stream dictionary).
    pub fn dictionary(&self, number: ObjectNumber) -> Option<Dictionary> {
        match self.lookup(number)? {
            Object::Dictionary(dict) => Some(convert_dictionary(dict)),
            Object::Stream(stream) => Some(convert_dictionary(&stream.dict)),
            _ => None,
        }
    }

    /// Follow a reference chain to a direct value; missing objects are `null`.
    ///
    /// # Errors
    ///
    /// `MalformedSource` if the chain does not end.
    pub fn resolve(&self, value: &Value) -> Result<Value> {
        let mut current = value.clone();
        for _ in 0..MAX_REFERENCE_CHAIN {
            let Value::Reference(number) = current else {
                return Ok(current);
            };
            current = match self.lookup(number) {
                Some(Object::Stream(_)) | None => Value::Null,
                Some(object) => convert(object),
            };
        }
        Err(self.malformed("reference chain too long"))
    }

    /// Highest generation of `number`; lopdf keys objects by number and
    /// generation.
    fn lookup(&self, number: ObjectNumber) -> Option<&Object> {
        self.document
            .objects
            .range((number, 0)..=(number, u16::MAX))
            .next_back()
            .map(|(_, object)| object)
    }
}

/// Decode with lopdf. Panics inside the decoder are reported as errors.
fn load(data: &[u8]) -> std::result::Result<lopdf::Document, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| lopdf::Document::load_mem(data))) {
        Ok(Ok(document)) => Ok(document),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("decoder failed on the document structure".to_string()),
    }
}

/// The trailer's `/Root` must name a dictionary.
fn has_catalog(document: &lopdf::Document) -> bool {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|id| document.get_dictionary(id))
        .is_ok()
}

fn convert(object: &Object) -> Value {
    match object {
        Object::Null => Value::Null,
        Object::Boolean(b) => Value::Bool(*b),
        Object::Integer(n) => Value::Integer(*n),
        Object::Real(r) => Value::Real(f64::from(*r)),
        Object::Name(name) => Value::Name(Name::new(name.clone())),
        Object::String(bytes, lopdf::StringFormat::Literal) => {
            Value::String(bytes.clone(), StringFormat::Literal)
        }
        Object::String(bytes, lopdf::StringFormat::Hexadecimal) => {
            Value::String(bytes.clone(), StringFormat::Hex)
        }
        Object::Array(items) => Value::Array(items.iter().map(convert).collect()),
        Object::Dictionary(dict) => Value::Dictionary(convert_dictionary(dict)),
        // A stream nested inside another object is invalid; keep its dictionary.
        Object::Stream(stream) => Value::Dictionary(convert_dictionary(&stream.dict)),
        Object::Reference((number, _)) => Value::Reference(*number),
    }
}

fn convert_dictionary(dict: &lopdf::Dictionary) -> Dictionary {
    dict.iter()
        .map(|(key, value)| (Name::new(key.clone()), convert(value)))
        .collect()
}
