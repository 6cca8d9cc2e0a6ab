//! CLI argument parsing for pdfstitch.
//!
//! This module defines the command-line interface using `clap` and turns
//! parsed arguments into a validated [`Config`]. It only refers to the
//! library through absolute `pdfstitch::` paths because `build.rs` includes
//! it to render the man page.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pdfstitch::config::{Config, Metadata, Operation, OverwriteMode, PageLayout, ReportFormat};
use pdfstitch::error::{PdfStitchError, Result};
use pdfstitch::utils::{collect_paths_for_patterns, read_input_list};

/// Merge PDF files and wrap images into PDFs.
///
/// pdfstitch combines the pages of several PDFs, in order, into one
/// document, or wraps a single PNG or JPEG into a one-page PDF. Unusable
/// merge inputs are skipped and reported; the rest are still merged.
#[derive(Parser, Debug)]
#[command(name = "pdfstitch")]
#[command(version)]
#[command(about = "Merge PDF files and wrap images into PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output - show per-file details and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Overwrite an existing output file without asking
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Never overwrite an existing output file
    #[arg(long, global = true, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Set title metadata for the output PDF
    #[arg(long, global = true, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for the output PDF
    #[arg(long, global = true, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for the output PDF
    #[arg(long, global = true, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for the output PDF (comma-separated)
    #[arg(long, global = true, value_name = "TEXT")]
    pub keywords: Option<String>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge PDF files, in the order given, into one document
    ///
    /// Examples:
    ///   pdfstitch merge a.pdf b.pdf -o book.pdf
    ///   pdfstitch merge 'chapters/*.pdf' --input-list extra.txt
    Merge(MergeArgs),

    /// Wrap a PNG or JPEG image into a single-page PDF
    ///
    /// Examples:
    ///   pdfstitch image-to-pdf photo.jpg
    ///   pdfstitch image-to-pdf scan.png --page-size a4 --margin 36
    ImageToPdf(ImageArgs),
}

/// Arguments of `merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files or glob patterns, merged in order
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path [default: merged_output.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Read more input paths from a file (one per line, '#' comments)
    ///
    /// Paths from the list are merged after the FILE arguments.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Dry run - locate every input and report page counts without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the merge report as JSON on stdout (an overwrite prompt, if
    /// any, is asked on stderr)
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `image-to-pdf`.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// PNG or JPEG image to wrap
    #[arg(value_name = "IMAGE")]
    pub input: PathBuf,

    /// Output PDF file path [default: output_image.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Page size: image (one point per pixel), letter, a4 or WIDTHxHEIGHT
    #[arg(long, value_name = "SIZE", default_value = "image")]
    pub page_size: String,

    /// Margin in points on every side of a fixed page size
    #[arg(long, value_name = "PTS", default_value_t = 0.0)]
    pub margin: f64,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// This method performs the following:
    /// - Expands glob patterns and the input list
    /// - Parses the page layout
    /// - Resolves overwrite mode and metadata
    /// - Validates the resulting configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A glob pattern is invalid or the input list is unreadable
    /// - A merge ends up with no inputs
    /// - The page size or margin is invalid
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let (operation, output) = match &self.command {
            Command::Merge(args) => {
                let mut inputs = collect_paths_for_patterns(&args.inputs)?;
                if let Some(list) = &args.input_list {
                    inputs.extend(read_input_list(list)?);
                }
                if inputs.is_empty() {
                    return Err(PdfStitchError::NoFilesToMerge);
                }
                (Operation::Merge { inputs }, args.output.clone())
            }
            Command::ImageToPdf(args) => {
                let layout = PageLayout::parse(&args.page_size, args.margin)?;
                let operation = Operation::ImageToPdf {
                    input: args.input.clone(),
                    layout,
                };
                (operation, args.output.clone())
            }
        };

        let mut config = Config::new(operation, output);
        config.verbose = self.verbose;
        config.quiet = self.quiet;
        config.overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };
        config.metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );
        if let Command::Merge(args) = &self.command {
            config.dry_run = args.dry_run;
            if args.json {
                config.report_format = ReportFormat::Json;
            }
        }

        config.validate().map_err(|e| {
            PdfStitchError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }
}
