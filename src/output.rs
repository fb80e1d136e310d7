//! Output formatting and styling module.
//!
//! Every line the tool prints goes through [`OutputFormatter`]. Progress lines
//! are written as they happen so a long run stays observable. Only fatal
//! errors go to stderr.

use crate::report::SortReport;
use colored::*;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a completed move as `source -> destination`.
    pub fn moved(from: &Path, to: &Path) {
        println!("{} Moving {} -> {}", "✓".green(), from.display(), to.display());
    }

    /// Prints a move that a dry run would perform.
    pub fn planned(from: &Path, to: &Path) {
        println!(
            "{}",
            format!("[DRY RUN] Would move {} -> {}", from.display(), to.display()).yellow()
        );
    }

    /// Prints a per-file failure. The run continues.
    pub fn failed(path: &Path, reason: &str) {
        println!(
            "{} Unable to process: {} ({})",
            "✗".red(),
            path.display(),
            reason
        );
    }

    /// Prints the removal of an emptied directory.
    pub fn pruned(dir: &Path) {
        println!("{} Deleting {}", "-".yellow(), dir.display());
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a fatal error to stderr.
    pub fn fatal(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the end-of-run summary table.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datesort::output::OutputFormatter;
    /// use datesort::report::SortReport;
    ///
    /// OutputFormatter::summary(&SortReport::default());
    /// ```
    pub fn summary(report: &SortReport) {
        Self::header("SUMMARY");

        let rows = [
            ("Moved", report.moved.len()),
            ("Planned", report.planned.len()),
            ("Already sorted", report.skipped.len()),
            ("Failed", report.failed.len()),
            ("Directories deleted", report.pruned.len()),
        ];
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        for (label, count) in rows {
            if label == "Planned" && count == 0 {
                continue;
            }
            let count = if label == "Failed" && count > 0 {
                count.to_string().red().bold()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, count, width = width);
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            report.total_processed().to_string().bold(),
            if report.total_processed() == 1 {
                "file"
            } else {
                "files"
            },
            width = width
        );

        if !report.walk_errors.is_empty() {
            Self::warning(&format!(
                "{} director{} could not be read or deleted",
                report.walk_errors.len(),
                if report.walk_errors.len() == 1 { "y" } else { "ies" }
            ));
        }
    }
}
