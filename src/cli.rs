//! Command-line interface module for datesort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and validation
//! - Mode selection (in-place reorganization or move into a new tree)
//! - Per-file orchestration: read capture date, resolve folder, move
//! - Run reporting

use crate::capture_time::{CaptureTimeSource, ExifReader};
use crate::config::{CompiledFilters, ConfigError, SortConfig};
use crate::date_folder::RawPolicy;
use crate::file_organizer::{FileOrganizer, OrganizeError, ProcessingOutcome};
use crate::output::OutputFormatter;
use crate::report::SortReport;
use crate::tree_walker::{TreeWalker, Visitor, WalkError};
use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort photos and videos into YYYY-MM-DD folders by their capture date.
#[derive(Debug, Parser)]
#[command(name = "datesort", version, about)]
pub struct CliArgs {
    /// Directory to reorganize in place, optionally followed by a destination
    /// directory to move the files into instead.
    #[arg(value_name = "DIRECTORY", required = true, num_args = 1..=2)]
    pub paths: Vec<PathBuf>,

    /// TOML file with the sort policy and file filters.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Put raw files in a sub-folder of their day folder.
    #[arg(long)]
    pub separate_raw: bool,

    /// Show what would be moved without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn options(&self) -> SortOptions {
        SortOptions {
            config_path: self.config.clone(),
            separate_raw: self.separate_raw,
            dry_run: self.dry_run,
        }
    }
}

/// Invocation errors. They are reported before the filesystem is touched.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Usage: datesort <directory> [dst_directory] (got {0} paths)")]
    WrongArgumentCount(usize),

    #[error("{} is not a valid directory.", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is a file, not a directory.", .0.display())]
    DestinationIsFile(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The operating mode selected from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCommand {
    /// Shuffle files among dated sub-folders of their own tree.
    InPlace { root: PathBuf },
    /// Move files out of `source` into dated folders under `destination`.
    Copy {
        source: PathBuf,
        destination: PathBuf,
    },
}

/// Run options that do not select the mode.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub config_path: Option<PathBuf>,
    pub separate_raw: bool,
    pub dry_run: bool,
}

impl SortCommand {
    /// Builds a command from one or two positional paths and validates it.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self, ArgumentError> {
        let command = match paths {
            [root] => SortCommand::InPlace { root: root.clone() },
            [source, destination] => SortCommand::Copy {
                source: source.clone(),
                destination: destination.clone(),
            },
            _ => return Err(ArgumentError::WrongArgumentCount(paths.len())),
        };
        command.validate()?;
        Ok(command)
    }

    /// Checks that the source is an existing directory and that the
    /// destination, if present, is not a file.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let source = match self {
            SortCommand::InPlace { root } => root,
            SortCommand::Copy { source, .. } => source,
        };
        if !source.is_dir() {
            return Err(ArgumentError::NotADirectory(source.clone()));
        }

        if let SortCommand::Copy { destination, .. } = self
            && destination.exists()
            && !destination.is_dir()
        {
            return Err(ArgumentError::DestinationIsFile(destination.clone()));
        }

        Ok(())
    }
}

/// Runs a sort with the EXIF reader and prints the summary.
///
/// Per-file failures never make this return an error; they are printed as
/// they happen and collected in the returned report.
///
/// # Examples
///
/// ```no_run
/// use datesort::cli::{run_cli, SortCommand, SortOptions};
/// use std::path::PathBuf;
///
/// let command = SortCommand::InPlace { root: PathBuf::from("/photos") };
/// match run_cli(command, &SortOptions::default()) {
///     Ok(report) => println!("{} files moved", report.moved.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: SortCommand, options: &SortOptions) -> Result<SortReport, ArgumentError> {
    run_cli_with_reader(command, options, &ExifReader)
}

/// Same as [`run_cli`], with the capture time source supplied by the caller.
pub fn run_cli_with_reader<R: CaptureTimeSource>(
    command: SortCommand,
    options: &SortOptions,
    reader: &R,
) -> Result<SortReport, ArgumentError> {
    command.validate()?;

    let mut config = SortConfig::load(options.config_path.as_deref())?;
    if options.separate_raw {
        config.policy.raw = RawPolicy::Separate;
    }
    let filters = config.filters.compile()?;

    if options.dry_run {
        OutputFormatter::warning("Dry run: no files will be moved.");
    }

    let report = match command {
        SortCommand::InPlace { root } => {
            OutputFormatter::info(&format!("Reorganizing {} in place", root.display()));
            let organizer =
                FileOrganizer::in_place(root.clone(), config.policy).with_dry_run(options.dry_run);
            sort_tree(&root, organizer, &filters, reader, !options.dry_run)
        }
        SortCommand::Copy {
            source,
            destination,
        } => {
            OutputFormatter::info(&format!(
                "Moving files from {} into {}",
                source.display(),
                destination.display()
            ));
            let organizer =
                FileOrganizer::copy_into(destination, config.policy).with_dry_run(options.dry_run);
            sort_tree(&source, organizer, &filters, reader, false)
        }
    };

    OutputFormatter::summary(&report);
    Ok(report)
}

/// Walks `root` once, sorting every visited file.
fn sort_tree<R: CaptureTimeSource>(
    root: &Path,
    organizer: FileOrganizer,
    filters: &CompiledFilters,
    reader: &R,
    prune_empty_dirs: bool,
) -> SortReport {
    let mut run = SortRun {
        root,
        organizer,
        filters,
        reader,
        report: SortReport::new(),
    };
    TreeWalker::new(prune_empty_dirs).walk(root, &mut run);
    run.report
}

/// Per-run state carried across file visits.
struct SortRun<'a, R> {
    root: &'a Path,
    organizer: FileOrganizer,
    filters: &'a CompiledFilters,
    reader: &'a R,
    report: SortReport,
}

impl<R: CaptureTimeSource> SortRun<'_, R> {
    fn process(&self, path: &Path) -> ProcessingOutcome {
        let Some(taken) = self.reader.read_capture_time(path) else {
            return ProcessingOutcome::Failed(OrganizeError::MetadataUnavailable {
                path: path.to_path_buf(),
            });
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let folder = self.organizer.policy().resolve(taken, &file_name);
        self.organizer.move_into(path, &folder)
    }
}

impl<R: CaptureTimeSource> Visitor for SortRun<'_, R> {
    fn visit_file(&mut self, path: &Path) {
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        if !self.filters.should_include(relative) {
            return;
        }

        let outcome = self.process(path);
        match &outcome {
            ProcessingOutcome::Moved { from, to } => OutputFormatter::moved(from, to),
            ProcessingOutcome::Planned { from, to } => OutputFormatter::planned(from, to),
            ProcessingOutcome::Failed(e) => OutputFormatter::failed(path, &e.to_string()),
            ProcessingOutcome::SkippedAlreadyInPlace => {}
        }
        self.report.record(path, outcome);
    }

    fn directory_pruned(&mut self, path: &Path) {
        OutputFormatter::pruned(path);
        self.report.pruned.push(path.to_path_buf());
    }

    fn walk_error(&mut self, error: WalkError) {
        OutputFormatter::warning(&error.to_string());
        self.report.walk_errors.push(error);
    }
}
