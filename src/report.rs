/// Run-level aggregation of per-file outcomes.
///
/// A report is built while the tree is walked and printed at the end. It is
/// never persisted.
use crate::file_organizer::{OrganizeError, ProcessingOutcome};
use crate::tree_walker::WalkError;
use std::path::{Path, PathBuf};

/// Represents the result of a sort run.
#[derive(Debug, Default)]
pub struct SortReport {
    /// Files moved, as `(from, to)`.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Dry-run moves, as `(from, to)`.
    pub planned: Vec<(PathBuf, PathBuf)>,
    /// Files already in their destination folder.
    pub skipped: Vec<PathBuf>,
    /// Files left at their original path, with the reason.
    pub failed: Vec<(PathBuf, OrganizeError)>,
    /// Directories removed because they ended up empty.
    pub pruned: Vec<PathBuf>,
    /// Directories that could not be listed or removed.
    pub walk_errors: Vec<WalkError>,
}

impl SortReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the outcome for `path` to the report.
    pub fn record(&mut self, path: &Path, outcome: ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Moved { from, to } => self.moved.push((from, to)),
            ProcessingOutcome::Planned { from, to } => self.planned.push((from, to)),
            ProcessingOutcome::SkippedAlreadyInPlace => self.skipped.push(path.to_path_buf()),
            ProcessingOutcome::Failed(e) => self.failed.push((path.to_path_buf(), e)),
        }
    }

    /// Returns the total number of files visited.
    pub fn total_processed(&self) -> usize {
        self.moved.len() + self.planned.len() + self.skipped.len() + self.failed.len()
    }

    /// Returns true if no file failed and every directory could be walked.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.walk_errors.is_empty()
    }
}
