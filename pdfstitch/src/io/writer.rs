//! Atomic PDF output.
//!
//! The document is serialized into a temporary file created next to the
//! destination, flushed, and only then renamed over the target path. A
//! failure at any point leaves the destination untouched.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::document::Document;
//! use pdfstitch::io::PdfWriter;
//! use std::path::Path;
//!
//! # fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let stats = PdfWriter::new().save(&doc, Path::new("output.pdf"))?;
//! println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
//! # Ok(())
//! # }
//! ```

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::{PdfStitchError, Result};
use crate::io::serializer;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to serialize and persist the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Number of indirect objects written.
    pub object_count: usize,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes documents to disk atomically.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    buffer_size: usize,
}

impl PdfWriter {
    /// Create a writer with the default buffer size.
    pub fn new() -> Self {
        Self { buffer_size: 8192 }
    }

    /// Create a writer with a custom output buffer size.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Serialize `doc` to `path`.
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure` if:
    /// - The destination directory doesn't exist or is not writable
    /// - The disk fills up while writing
    /// - The final rename fails
    pub fn save(&self, doc: &Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();
        let failure = |e: std::io::Error| PdfStitchError::write_failure(path.to_path_buf(), e);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).map_err(failure)?;
        debug!("Writing {} via {}", path.display(), temp.path().display());

        let mut writer = BufWriter::with_capacity(self.buffer_size, temp.as_file());
        let (xref, startxref) =
            serializer::write_to(&mut writer, doc.store(), doc.catalog(), doc.info())
                .map_err(failure)?;
        writer.flush().map_err(failure)?;
        drop(writer);
        temp.as_file().sync_all().map_err(failure)?;

        temp.persist(path).map_err(|e| failure(e.error))?;

        let file_size = std::fs::metadata(path).map_err(failure)?.len();
        let stats = WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            object_count: xref.len() - 1,
            output_path: path.to_path_buf(),
        };
        info!(
            "Wrote {} ({} objects, {}, startxref {startxref})",
            path.display(),
            stats.object_count,
            stats.format_file_size()
        );
        Ok(stats)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
