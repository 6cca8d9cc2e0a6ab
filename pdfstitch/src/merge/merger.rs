//! Core merge implementation.
//!
//! Every source goes through the same stages: it is opened, its structure
//! located, its pages and their objects extracted, and those registered
//! into the target document. A source failing any stage before
//! registration is skipped and recorded in the [`MergeReport`].

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Metadata;
use crate::document::Document;
use crate::error::{PdfStitchError, Result};
use crate::io::reader::{SourceDocument, read_source};
use crate::merge::pages::{read_page_tree, stage_objects};

/// Stage a source is in while being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceStage {
    /// Reading the file from disk.
    Open,
    /// Finding the trailer, catalog and page tree.
    LocateStructure,
    /// Loading the pages and every object they reach.
    ExtractPages,
    /// Renumbering and registering objects into the output.
    RegisterIntoTarget,
    /// Done with the source.
    Closed,
}

impl fmt::Display for SourceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "Open",
            Self::LocateStructure => "LocateStructure",
            Self::ExtractPages => "ExtractPages",
            Self::RegisterIntoTarget => "RegisterIntoTarget",
            Self::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// A source whose pages made it into the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedSource {
    /// Source path as given.
    pub path: PathBuf,
    /// Pages contributed.
    pub pages: usize,
    /// Objects copied (zero for dry runs).
    pub objects: usize,
    /// Whether the cross-reference data had to be rebuilt by scanning.
    pub recovered: bool,
}

/// A source that was left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    /// Source path as given.
    pub path: PathBuf,
    /// Stage the source failed in.
    pub stage: SourceStage,
    /// Error text.
    pub error: String,
}

/// Outcome of a merge or a dry run, per source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Sources merged, in input order.
    pub succeeded: Vec<MergedSource>,
    /// Sources skipped, in input order.
    pub skipped: Vec<SkippedSource>,
    /// Pages in the output.
    pub total_pages: usize,
    /// Whether this report comes from a dry run.
    pub dry_run: bool,
    /// Time spent merging.
    #[serde(skip)]
    pub merge_time: Duration,
}

impl MergeReport {
    /// Number of sources merged.
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Number of sources skipped.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Fail with `NoInputsSucceeded` unless at least one source merged.
    pub fn check(&self) -> Result<()> {
        if self.succeeded.is_empty() {
            return Err(PdfStitchError::NoInputsSucceeded {
                skipped: self.skipped_count(),
            });
        }
        Ok(())
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PdfStitchError::other(format!("Failed to serialize report: {e}")))
    }

    fn skip(&mut self, path: &Path, stage: SourceStage, error: &PdfStitchError) {
        info!("Skipping {} ({stage}): {error}", path.display());
        self.skipped.push(SkippedSource {
            path: path.to_path_buf(),
            stage,
            error: error.to_string(),
        });
    }
}

/// Result of a merge operation.
#[derive(Debug)]
pub struct MergeResult {
    /// The merged document, not yet written.
    pub document: Document,

    /// What happened to each source.
    pub report: MergeReport,
}

/// Combines the pages of several PDFs into one document.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    metadata: Metadata,
}

impl Merger {
    /// Create a merger that writes no document information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document information written to the output.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Merge `inputs`, in order, into a new document.
    ///
    /// Sources that are missing, unreadable, encrypted or malformed are
    /// skipped and recorded in the report; the merge carries on with the
    /// rest. The result may therefore contain zero pages, see
    /// [`MergeReport::check`].
    ///
    /// # Arguments
    ///
    /// * `inputs` - Source PDF paths in output order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `inputs` is empty
    /// - Registering extracted pages into the output fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfstitch::merge::Merger;
    /// # use std::path::PathBuf;
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
    /// let result = Merger::new().merge(&inputs)?;
    /// println!("Merged {} files into {} pages",
    ///          result.report.succeeded_count(),
    ///          result.report.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub fn merge(&self, inputs: &[PathBuf]) -> Result<MergeResult> {
        if inputs.is_empty() {
            return Err(PdfStitchError::NoFilesToMerge);
        }

        let start = Instant::now();
        let mut document = Document::new();
        let mut report = MergeReport::default();

        for (index, path) in inputs.iter().enumerate() {
            info!("[{}/{}] Merging {}", index + 1, inputs.len(), path.display());
            match self.merge_source(&mut document, path) {
                Ok(merged) => report.succeeded.push(merged),
                Err((stage, error)) if error.is_recoverable() => {
                    report.skip(path, stage, &error);
                }
                Err((_, error)) => return Err(error),
            }
        }

        document.set_info(&self.metadata);
        report.total_pages = document.page_count();
        report.merge_time = start.elapsed();

        info!(
            "Merged {} of {} sources into {} pages in {:.2}s",
            report.succeeded_count(),
            inputs.len(),
            report.total_pages,
            report.merge_time.as_secs_f64()
        );

        Ok(MergeResult { document, report })
    }

    /// Locate every source and count its pages without building output.
    pub fn plan(&self, inputs: &[PathBuf]) -> MergeReport {
        let start = Instant::now();
        let mut report = MergeReport {
            dry_run: true,
            ..MergeReport::default()
        };

        for path in inputs {
            match locate(path) {
                Ok((source, pages)) => {
                    report.total_pages += pages;
                    report.succeeded.push(MergedSource {
                        path: path.clone(),
                        pages,
                        objects: 0,
                        recovered: source.was_recovered(),
                    });
                }
                Err((stage, error)) => report.skip(path, stage, &error),
            }
        }

        report.merge_time = start.elapsed();
        report
    }

    fn merge_source(
        &self,
        document: &mut Document,
        path: &Path,
    ) -> std::result::Result<MergedSource, (SourceStage, PdfStitchError)> {
        let data = read_source(path).map_err(|e| (SourceStage::Open, e))?;
        debug!("{}: {} -> {}", path.display(), SourceStage::Open, SourceStage::LocateStructure);

        let source =
            SourceDocument::parse(path, data).map_err(|e| (SourceStage::LocateStructure, e))?;
        let tree = read_page_tree(&source).map_err(|e| (SourceStage::LocateStructure, e))?;
        debug!(
            "{}: {} -> {}",
            path.display(),
            SourceStage::LocateStructure,
            SourceStage::ExtractPages
        );

        let staged = stage_objects(&source, tree).map_err(|e| (SourceStage::ExtractPages, e))?;
        let recovered = source.was_recovered();
        if recovered {
            warn!("{}: cross-reference data is damaged, rebuilt by scanning", path.display());
        }
        drop(source);
        debug!(
            "{}: {} -> {} ({} objects)",
            path.display(),
            SourceStage::ExtractPages,
            SourceStage::RegisterIntoTarget,
            staged.object_count()
        );

        let objects = staged.object_count();
        let pages = staged
            .register_into(document)
            .map_err(|e| (SourceStage::RegisterIntoTarget, e))?;
        debug!(
            "{}: {} -> {} ({} pages)",
            path.display(),
            SourceStage::RegisterIntoTarget,
            SourceStage::Closed,
            pages.len()
        );

        Ok(MergedSource {
            path: path.to_path_buf(),
            pages: pages.len(),
            objects,
            recovered,
        })
    }
}

fn locate(path: &Path) -> std::result::Result<(SourceDocument, usize), (SourceStage, PdfStitchError)> {
    let data = read_source(path).map_err(|e| (SourceStage::Open, e))?;
    let source =
        SourceDocument::parse(path, data).map_err(|e| (SourceStage::LocateStructure, e))?;
    let tree = read_page_tree(&source).map_err(|e| (SourceStage::LocateStructure, e))?;
    Ok((source, tree.page_count()))
}
