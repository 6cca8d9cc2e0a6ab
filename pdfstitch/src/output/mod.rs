//! Output formatting and display for pdfstitch.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - Merge reports and dry-run plans
//! - Write summaries
//! - Quiet and verbose modes
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::output::OutputFormatter;
//! use pdfstitch::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Starting merge");
//! formatter.success("Merge completed");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::config::Config;
use crate::io::WriteStatistics;
use crate::merge::MergeReport;

/// Create an output formatter from configuration.
pub fn create_formatter(config: &Config) -> OutputFormatter {
    OutputFormatter::from_config(config)
}

/// One-line summary of a merge, as printed and logged.
pub fn merge_summary(report: &MergeReport) -> String {
    let total = report.succeeded_count() + report.skipped_count();
    let mut summary = format!(
        "{} of {} source(s) merged, {} page(s)",
        report.succeeded_count(),
        total,
        report.total_pages
    );
    if report.skipped_count() > 0 {
        summary.push_str(&format!(", {} skipped", report.skipped_count()));
    }
    summary
}

/// Display the outcome of a merge.
///
/// Skipped sources are always shown; per-source details only in verbose
/// mode.
///
/// # Arguments
///
/// * `formatter` - Output formatter to use
/// * `report` - Report returned by the merger
pub fn display_merge_report(formatter: &OutputFormatter, report: &MergeReport) {
    for skipped in &report.skipped {
        formatter.warning(&format!(
            "Skipped {} ({}): {}",
            skipped.path.display(),
            skipped.stage,
            skipped.error
        ));
    }

    for merged in &report.succeeded {
        formatter.debug(&format!("{}: {} page(s)", merged.path.display(), merged.pages));
        formatter.detail("Objects copied", &merged.objects.to_string());
        if merged.recovered {
            formatter.detail("Cross-reference", "rebuilt by scanning");
        }
    }

    formatter.info(&merge_summary(report));
}

/// Display a dry-run plan: what would be merged, in order.
pub fn display_merge_plan(formatter: &OutputFormatter, report: &MergeReport, config: &Config) {
    formatter.section("Dry run, nothing will be written");
    for (index, merged) in report.succeeded.iter().enumerate() {
        formatter.list_item(
            index + 1,
            &format!("{} ({} page(s))", merged.path.display(), merged.pages),
        );
    }
    for skipped in &report.skipped {
        formatter.warning(&format!(
            "Would skip {} ({}): {}",
            skipped.path.display(),
            skipped.stage,
            skipped.error
        ));
    }
    formatter.blank_line();
    formatter.info(&format!(
        "Would write {} page(s) to {}",
        report.total_pages,
        config.output.display()
    ));
}

/// Display where and how much was written.
pub fn display_write_statistics(formatter: &OutputFormatter, stats: &WriteStatistics) {
    formatter.success(&format!(
        "Wrote {} ({})",
        stats.output_path.display(),
        stats.format_file_size()
    ));
    formatter.detail("Objects", &stats.object_count.to_string());
    formatter.detail(
        "Write time",
        &format!("{:.2}s", stats.write_time.as_secs_f64()),
    );
}
