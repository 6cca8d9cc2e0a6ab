//! Configuration module for pdfstitch.
//!
//! This module holds the validated, normalized settings that drive one run
//! of the tool. The CLI crate builds a [`Config`] from its arguments; the
//! library never reads process-wide state.

use anyhow::{Result, bail};

use crate::error::PdfStitchError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output name used for merges when no `-o` is given.
pub const DEFAULT_MERGE_OUTPUT: &str = "merged_output.pdf";

/// Output name used for image wrapping when no `-o` is given.
pub const DEFAULT_IMAGE_OUTPUT: &str = "output_image.pdf";

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl PageSize {
    /// US Letter, 8.5 x 11 in.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
    };

    /// ISO A4, rounded to whole points.
    pub const A4: Self = Self {
        width: 595.0,
        height: 842.0,
    };
}

impl FromStr for PageSize {
    type Err = PdfStitchError;

    /// Parse `letter`, `a4` or an explicit `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "letter" => Ok(Self::LETTER),
            "a4" => Ok(Self::A4),
            other => {
                let invalid = || {
                    PdfStitchError::invalid_config(format!(
                        "Invalid page size: {s}. Use letter, a4 or WIDTHxHEIGHT in points"
                    ))
                };
                let (w, h) = other.split_once('x').ok_or_else(invalid)?;
                let width: f64 = w.trim().parse().map_err(|_| invalid())?;
                let height: f64 = h.trim().parse().map_err(|_| invalid())?;
                if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
                    return Err(invalid());
                }
                Ok(Self { width, height })
            }
        }
    }
}

/// How a wrapped image is placed on its page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageLayout {
    /// The MediaBox is the image size, one pixel per point.
    #[default]
    ImageSize,
    /// A fixed page; the image is scaled to fit inside the margins and centred.
    Fixed {
        /// Page dimensions.
        size: PageSize,
        /// Margin on every side, in points.
        margin: f64,
    },
}

impl PageLayout {
    /// Parse a `--page-size` value (`image`, `letter`, `a4`, `WxH`) with a margin.
    pub fn parse(page_size: &str, margin: f64) -> crate::Result<Self> {
        if page_size.trim().eq_ignore_ascii_case("image") {
            return Ok(Self::ImageSize);
        }
        Ok(Self::Fixed {
            size: page_size.parse()?,
            margin,
        })
    }
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// How the merge report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON document on stdout.
    Json,
}

/// The operation a run performs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Merge PDFs in the given order.
    Merge {
        /// Source PDF paths.
        inputs: Vec<PathBuf>,
    },
    /// Wrap one PNG or JPEG into a single-page PDF.
    ImageToPdf {
        /// Image path.
        input: PathBuf,
        /// Page placement.
        layout: PageLayout,
    },
}

impl Operation {
    /// Output path used when none is given.
    pub fn default_output(&self) -> PathBuf {
        match self {
            Self::Merge { .. } => PathBuf::from(DEFAULT_MERGE_OUTPUT),
            Self::ImageToPdf { .. } => PathBuf::from(DEFAULT_IMAGE_OUTPUT),
        }
    }

    /// Every input path of the operation.
    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            Self::Merge { inputs } => inputs.iter().map(PathBuf::as_path).collect(),
            Self::ImageToPdf { input, .. } => vec![input.as_path()],
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// What to do.
    pub operation: Operation,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Dry run mode - locate sources without creating output (merge only).
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Metadata to set on output document.
    pub metadata: Metadata,

    /// How the merge report is printed.
    pub report_format: ReportFormat,
}

impl Config {
    /// Create a configuration with default flags for `operation`.
    pub fn new(operation: Operation, output: Option<PathBuf>) -> Self {
        let output = output.unwrap_or_else(|| operation.default_output());
        Self {
            operation,
            output,
            dry_run: false,
            verbose: false,
            quiet: false,
            overwrite_mode: OverwriteMode::default(),
            metadata: Metadata::default(),
            report_format: ReportFormat::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A merge has no input files
    /// - Verbose and quiet modes are both enabled
    /// - Dry run is requested for an image
    /// - The output path equals an input path
    /// - A fixed page layout leaves no room for the image
    pub fn validate(&self) -> Result<()> {
        match &self.operation {
            Operation::Merge { inputs } => {
                if inputs.is_empty() {
                    bail!("No input files specified");
                }
            }
            Operation::ImageToPdf { layout, .. } => {
                if self.dry_run {
                    bail!("--dry-run is only supported for merge");
                }
                if let PageLayout::Fixed { size, margin } = layout
                    && (*margin < 0.0
                        || margin * 2.0 >= size.width
                        || margin * 2.0 >= size.height)
                {
                    bail!(
                        "Margin {margin} leaves no drawable area on a {}x{} page",
                        size.width,
                        size.height
                    );
                }
            }
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        for input in self.operation.inputs() {
            if input == self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        Ok(())
    }

    /// Check if progress output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
