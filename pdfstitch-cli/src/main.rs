//! pdfstitch - Merge PDF files and wrap images into PDFs.
//!
//! Command dispatcher: parses arguments, sets up logging, runs the
//! requested operation and maps failures to exit codes.

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pdfstitch::config::{Config, Operation, OverwriteMode, PageLayout, ReportFormat};
use pdfstitch::error::PdfStitchError;
use pdfstitch::image::ImageWrapper;
use pdfstitch::io::PdfWriter;
use pdfstitch::merge::{MergeReport, MergeResult, Merger};
use pdfstitch::output::{
    OutputFormatter, display_merge_plan, display_merge_report, display_write_statistics,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Run the application and handle errors
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Install a stderr subscriber whose level comes only from the flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("pdfstitch={level}")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
fn run(cli: Cli) -> Result<(), PdfStitchError> {
    let config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);
    formatter.debug(&format!("{} v{}", pdfstitch::NAME, pdfstitch::VERSION));

    match &config.operation {
        Operation::Merge { inputs } => run_merge(&config, inputs, &formatter),
        Operation::ImageToPdf { input, layout } => run_image(&config, input, *layout, &formatter),
    }
}

fn run_merge(
    config: &Config,
    inputs: &[PathBuf],
    formatter: &OutputFormatter,
) -> Result<(), PdfStitchError> {
    let merger = Merger::new().with_metadata(config.metadata.clone());

    // Dry run mode - locate sources, write nothing
    if config.dry_run {
        let report = merger.plan(inputs);
        match config.report_format {
            ReportFormat::Json => formatter.raw(&report.to_json()?),
            ReportFormat::Text => display_merge_plan(formatter, &report, config),
        }
        return report.check();
    }

    handle_output_overwrite(config, formatter)?;

    formatter.info(&format!("Merging {} file(s)...", inputs.len()));
    let MergeResult { document, report } = merger.merge(inputs)?;
    print_report(config, formatter, &report)?;
    report.check()?;

    formatter.info(&format!("Writing to: {}", config.output.display()));
    let stats = PdfWriter::new().save(&document, &config.output)?;
    display_write_statistics(formatter, &stats);
    Ok(())
}

fn print_report(
    config: &Config,
    formatter: &OutputFormatter,
    report: &MergeReport,
) -> Result<(), PdfStitchError> {
    match config.report_format {
        ReportFormat::Json => formatter.raw(&report.to_json()?),
        ReportFormat::Text => display_merge_report(formatter, report),
    }
    Ok(())
}

fn run_image(
    config: &Config,
    input: &Path,
    layout: PageLayout,
    formatter: &OutputFormatter,
) -> Result<(), PdfStitchError> {
    handle_output_overwrite(config, formatter)?;

    formatter.info(&format!("Wrapping {}...", input.display()));
    let document = ImageWrapper::new(layout)
        .with_metadata(config.metadata.clone())
        .wrap_file(input)?;

    let stats = PdfWriter::new().save(&document, &config.output)?;
    display_write_statistics(formatter, &stats);
    Ok(())
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PdfStitchError> {
    confirm_overwrite(config, formatter, &mut io::stdin().lock(), &mut io::stderr())
}

/// Decide whether an existing output may be replaced. In prompt mode the
/// question goes to `prompt` (stderr in the binary, so a JSON report on
/// stdout stays parseable) and the answer is read from `input`.
fn confirm_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<(), PdfStitchError> {
    if !config.output.exists() {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfStitchError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet mode
            if config.quiet {
                return Err(PdfStitchError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));
            write!(prompt, "Overwrite? [y/N]: ").ok();
            prompt.flush().ok();

            let mut response = String::new();
            input
                .read_line(&mut response)
                .map_err(|err| PdfStitchError::other(format!("Failed to read input: {err}")))?;

            if is_yes(&response) {
                Ok(())
            } else {
                Err(PdfStitchError::Cancelled)
            }
        }
    }
}

fn is_yes(response: &str) -> bool {
    matches!(response.trim().to_lowercase().as_str(), "y" | "yes")
}
