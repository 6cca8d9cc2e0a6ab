//! PDF merging.
//!
//! This module combines the pages of several source PDFs into one
//! document:
//! - Page tree walking with inherited attributes
//! - Object import under fresh numbers
//! - Skip-and-continue for unusable sources
//! - Dry-run planning
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::merge::Merger;
//! use pdfstitch::io::PdfWriter;
//! use std::path::{Path, PathBuf};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let result = Merger::new().merge(&inputs)?;
//! result.report.check()?;
//! PdfWriter::new().save(&result.document, Path::new("merged.pdf"))?;
//! println!("Merged {} pages", result.report.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod pages;

pub use merger::{MergeReport, MergeResult, MergedSource, Merger, SkippedSource, SourceStage};
pub use pages::{PageTree, StagedSource};

use crate::config::{Config, Operation};
use crate::error::{PdfStitchError, Result};
use crate::io::{PdfWriter, WriteStatistics};

/// Merge the inputs of a merge configuration and write the output.
///
/// Convenience function that runs a [`Merger`] and a [`PdfWriter`]. In dry
/// run mode nothing is written and no statistics are returned.
///
/// # Arguments
///
/// * `config` - Configuration whose operation is [`Operation::Merge`]
///
/// # Returns
///
/// The merge report and, unless dry running, statistics about the write.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is not a merge
/// - No source could be merged
/// - The output cannot be written
///
/// # Examples
///
/// ```no_run
/// use pdfstitch::config::{Config, Operation};
/// use pdfstitch::merge::merge_pdfs;
/// use std::path::PathBuf;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let operation = Operation::Merge {
///     inputs: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
/// };
/// let config = Config::new(operation, None);
/// let (report, stats) = merge_pdfs(&config)?;
/// println!("{} pages", report.total_pages);
/// # Ok(())
/// # }
/// ```
pub fn merge_pdfs(config: &Config) -> Result<(MergeReport, Option<WriteStatistics>)> {
    let Operation::Merge { inputs } = &config.operation else {
        return Err(PdfStitchError::invalid_config(
            "merge_pdfs needs a merge operation",
        ));
    };

    let merger = Merger::new().with_metadata(config.metadata.clone());
    if config.dry_run {
        return Ok((merger.plan(inputs), None));
    }

    let result = merger.merge(inputs)?;
    result.report.check()?;
    let stats = PdfWriter::new().save(&result.document, &config.output)?;
    Ok((result.report, Some(stats)))
}
