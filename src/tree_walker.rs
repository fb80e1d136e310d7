//! Depth-first directory traversal with optional empty-directory pruning.
//!
//! At each level every subdirectory is walked before the level's own files are
//! visited. Entries are sorted by name so runs are reproducible. Symbolic links
//! are neither followed nor visited.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported during a walk. None of them stop the walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete directory {}: {source}", path.display())]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Receives the events of a walk as they happen.
pub trait Visitor {
    /// Called once for every regular file.
    fn visit_file(&mut self, path: &Path);

    /// Called after an empty directory has been removed.
    fn directory_pruned(&mut self, _path: &Path) {}

    /// Called when a directory could not be listed or removed.
    fn walk_error(&mut self, _error: WalkError) {}
}

/// Recursive directory walker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker {
    prune_empty_dirs: bool,
}

impl TreeWalker {
    pub fn new(prune_empty_dirs: bool) -> Self {
        Self { prune_empty_dirs }
    }

    /// Walks `root`, calling `visitor` for each file.
    ///
    /// With pruning enabled, a directory is removed once its whole subtree has
    /// been processed, if it then has no entries left. The removal is
    /// non-recursive, so a directory that still holds anything (including a
    /// file that failed to process) is never deleted. `root` itself is kept.
    pub fn walk<V: Visitor>(&self, root: &Path, visitor: &mut V) {
        self.walk_dir(root, visitor, true);
    }

    fn walk_dir<V: Visitor>(&self, dir: &Path, visitor: &mut V, is_root: bool) {
        let (subdirs, files) = match list_dir(dir) {
            Ok(listing) => listing,
            Err(e) => {
                visitor.walk_error(e);
                return;
            }
        };

        for subdir in &subdirs {
            self.walk_dir(subdir, visitor, false);
        }

        for file in &files {
            visitor.visit_file(file);
        }

        if self.prune_empty_dirs && !is_root {
            prune_if_empty(dir, visitor);
        }
    }
}

/// Lists `dir` once, returning sorted subdirectories and regular files.
fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), WalkError> {
    let read_error = |e: io::Error| WalkError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        // `DirEntry::file_type` does not follow symlinks.
        let file_type = entry.file_type().map_err(read_error)?;
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }

    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}

fn prune_if_empty<V: Visitor>(dir: &Path, visitor: &mut V) {
    let is_empty = match fs::read_dir(dir) {
        // An unreadable entry counts as content.
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => {
            visitor.walk_error(WalkError::ReadDir {
                path: dir.to_path_buf(),
                source: e,
            });
            return;
        }
    };

    if !is_empty {
        return;
    }

    match fs::remove_dir(dir) {
        Ok(()) => visitor.directory_pruned(dir),
        Err(e) => visitor.walk_error(WalkError::RemoveDir {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}
