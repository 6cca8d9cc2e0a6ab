//! I/O for pdfstitch.
//!
//! This module handles everything that touches bytes on disk:
//! - Reading source PDFs through lopdf, rebuilding damaged indexes
//! - Serializing a [`Document`] into PDF bytes
//! - Writing the output atomically
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::document::Document;
//! use pdfstitch::io::{PdfWriter, load_source};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = load_source(Path::new("input.pdf"))?;
//! println!("{} objects", source.object_count());
//!
//! let writer = PdfWriter::new();
//! writer.save(&Document::new(), Path::new("output.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
mod scan;
pub mod serializer;
pub mod writer;

pub use reader::{SourceDocument, read_source};
pub use serializer::{SerializedDocument, XrefEntry};
pub use writer::{PdfWriter, WriteStatistics};

use crate::document::Document;
use crate::error::Result;
use std::path::Path;

/// Read a source PDF and locate its objects.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a PDF, or is
/// encrypted.
pub fn load_source(path: &Path) -> Result<SourceDocument> {
    let data = read_source(path)?;
    SourceDocument::parse(path, data)
}

/// Save a document to a file with default writer settings.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_pdf(doc: &Document, path: &Path) -> Result<WriteStatistics> {
    PdfWriter::new().save(doc, path)
}
