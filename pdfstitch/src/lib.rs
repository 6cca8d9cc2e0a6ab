//! pdfstitch - Merge PDF files and wrap images into PDFs.
//!
//! This library assembles PDF documents from an in-memory object graph and
//! serializes them with an exact cross-reference table. It supports:
//!
//! - Merging the pages of several PDFs, in order, into one document
//! - Skipping unusable sources while merging the rest
//! - Wrapping a PNG or JPEG into a single-page PDF
//! - Deterministic, atomic output
//!
//! # Examples
//!
//! ## Basic Merge
//!
//! ```no_run
//! use pdfstitch::merge;
//! use pdfstitch::config::{Config, Operation};
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let operation = Operation::Merge {
//!     inputs: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
//! };
//! let config = Config::new(operation, Some(PathBuf::from("merged.pdf")));
//!
//! let (report, _stats) = merge::merge_pdfs(&config)?;
//! println!("Created {} page document", report.total_pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Wrapping an Image
//!
//! ```no_run
//! use pdfstitch::config::{PageLayout, PageSize};
//! use pdfstitch::image::ImageWrapper;
//! use pdfstitch::io::PdfWriter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = PageLayout::Fixed { size: PageSize::A4, margin: 36.0 };
//! let doc = ImageWrapper::new(layout).wrap_file(Path::new("scan.png"))?;
//! PdfWriter::new().save(&doc, Path::new("scan.pdf"))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod filters;
pub mod image;
pub mod io;
pub mod merge;
pub mod object;
pub mod output;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use document::Document;
pub use error::{PdfStitchError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
