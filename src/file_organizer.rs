/// Safe relocation of files into their destination folders.
///
/// A move either completes with the file intact at its destination or leaves
/// the file untouched at its source. An existing file is never replaced: the
/// destination is claimed with `hard_link` (or a `create_new` copy when linking
/// is impossible, e.g. across devices), both of which fail atomically if the
/// name is taken.
use crate::date_folder::{DestinationFolder, SortPolicy};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while processing a single file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The file carries no readable capture timestamp.
    #[error("no capture timestamp found in {}", path.display())]
    MetadataUnavailable { path: PathBuf },

    /// A file with the same name already exists at the destination.
    #[error("{} already exists", destination.display())]
    Collision { path: PathBuf, destination: PathBuf },

    /// Failed to create the destination directory.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to move a file to its destination.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination was written but the original could not be removed.
    /// The new copy at `destination` is discarded again; if that fails too,
    /// `rollback` holds the error and the file exists in both places.
    #[error(
        "could not remove {} after moving it: {source}{}",
        path.display(),
        rollback_note(destination, rollback.as_ref())
    )]
    SourceCleanupFailed {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
        rollback: Option<io::Error>,
    },

    #[error("{} has no file name", path.display())]
    NoFileName { path: PathBuf },
}

fn rollback_note(destination: &Path, rollback: Option<&io::Error>) -> String {
    match rollback {
        Some(e) => format!(
            " (a duplicate was left at {}: {})",
            destination.display(),
            e
        ),
        None => String::new(),
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What happened to one visited file.
#[derive(Debug)]
pub enum ProcessingOutcome {
    Moved { from: PathBuf, to: PathBuf },
    /// Dry-run only: the move that would have been performed.
    Planned { from: PathBuf, to: PathBuf },
    SkippedAlreadyInPlace,
    Failed(OrganizeError),
}

/// Moves files into dated folders, either under a separate destination root
/// (copy mode) or beside their current location (in-place mode).
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    mode: Mode,
    policy: SortPolicy,
    dry_run: bool,
}

#[derive(Debug, Clone)]
enum Mode {
    Copy { dest_root: PathBuf },
    /// Files never leave `root`.
    InPlace { root: PathBuf },
}

impl FileOrganizer {
    /// Organizer that moves files into `dest_root/<folder>`.
    pub fn copy_into(dest_root: impl Into<PathBuf>, policy: SortPolicy) -> Self {
        Self {
            mode: Mode::Copy {
                dest_root: dest_root.into(),
            },
            policy,
            dry_run: false,
        }
    }

    /// Organizer that moves files into `<current parent>/<folder>`, never
    /// above the walked `root`.
    pub fn in_place(root: impl Into<PathBuf>, policy: SortPolicy) -> Self {
        Self {
            mode: Mode::InPlace { root: root.into() },
            policy,
            dry_run: false,
        }
    }

    /// When enabled, moves are computed and reported but never performed.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn policy(&self) -> &SortPolicy {
        &self.policy
    }

    /// Moves `file` into `folder` and reports the outcome.
    ///
    /// Never panics and never returns an error: every failure becomes
    /// [`ProcessingOutcome::Failed`] with the file left at its source.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chrono::NaiveDate;
    /// use datesort::date_folder::SortPolicy;
    /// use datesort::file_organizer::{FileOrganizer, ProcessingOutcome};
    /// use std::path::Path;
    ///
    /// let policy = SortPolicy::default();
    /// let taken = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap().and_hms_opt(10, 0, 0).unwrap();
    /// let folder = policy.resolve(taken, "IMG_0001.JPG");
    ///
    /// let organizer = FileOrganizer::copy_into("/photos/sorted", policy);
    /// match organizer.move_into(Path::new("/photos/inbox/IMG_0001.JPG"), &folder) {
    ///     ProcessingOutcome::Moved { to, .. } => println!("Moved to {}", to.display()),
    ///     ProcessingOutcome::Failed(e) => eprintln!("{}", e),
    ///     _ => {}
    /// }
    /// ```
    pub fn move_into(&self, file: &Path, folder: &DestinationFolder) -> ProcessingOutcome {
        match self.try_move_into(file, folder) {
            Ok(outcome) => outcome,
            Err(e) => ProcessingOutcome::Failed(e),
        }
    }

    fn try_move_into(
        &self,
        file: &Path,
        folder: &DestinationFolder,
    ) -> OrganizeResult<ProcessingOutcome> {
        let file_name = file.file_name().ok_or_else(|| OrganizeError::NoFileName {
            path: file.to_path_buf(),
        })?;

        let Some(target_dir) = self.target_dir(file, folder)? else {
            return Ok(ProcessingOutcome::SkippedAlreadyInPlace);
        };
        let destination = target_dir.join(file_name);

        if self.dry_run {
            if destination.symlink_metadata().is_ok() {
                return Err(OrganizeError::Collision {
                    path: file.to_path_buf(),
                    destination,
                });
            }
            return Ok(ProcessingOutcome::Planned {
                from: file.to_path_buf(),
                to: destination,
            });
        }

        // Idempotent: succeeds when the directory is already there.
        fs::create_dir_all(&target_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: target_dir.clone(),
            source: e,
        })?;

        move_file_exclusive(file, &destination)?;

        Ok(ProcessingOutcome::Moved {
            from: file.to_path_buf(),
            to: destination,
        })
    }

    /// Computes the absolute directory `file` belongs in, or `None` when it
    /// is already there.
    pub fn target_dir(
        &self,
        file: &Path,
        folder: &DestinationFolder,
    ) -> OrganizeResult<Option<PathBuf>> {
        let parent = file.parent().ok_or_else(|| OrganizeError::NoFileName {
            path: file.to_path_buf(),
        })?;

        match &self.mode {
            Mode::Copy { dest_root } => {
                let target = dest_root.join(folder.to_path_buf());
                if same_directory(parent, &target) {
                    Ok(None)
                } else {
                    Ok(Some(target))
                }
            }
            Mode::InPlace { root } => Ok(self.in_place_target(root, parent, folder)),
        }
    }

    /// Finds the in-place target for a file living in `parent`.
    ///
    /// Path components are compared for exact equality, so `trip-2023-07-04`
    /// never counts as the `2023-07-04` folder. Folding stops at `root`.
    fn in_place_target(
        &self,
        root: &Path,
        parent: &Path,
        folder: &DestinationFolder,
    ) -> Option<PathBuf> {
        let relative = folder.to_path_buf();
        if parent.ends_with(&relative) {
            return None;
        }

        // Fold layout folders (e.g. `2023-07-04/RAW` under a shared policy)
        // back into the day folder they hang off.
        let collapsible = self.policy.collapsible(folder);
        let mut base = parent;
        while base != root
            && base
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| collapsible.contains(&name))
        {
            match base.parent() {
                Some(up) => base = up,
                None => break,
            }
            if base.ends_with(&relative) {
                return Some(base.to_path_buf());
            }
        }

        // Complete a partially applied layout, e.g. a raw file already in its
        // day folder that now needs the raw sub-folder.
        let segments = folder.segments();
        for split in (1..segments.len()).rev() {
            let head: PathBuf = segments[..split].iter().collect();
            if parent.ends_with(&head) {
                let tail: PathBuf = segments[split..].iter().collect();
                return Some(parent.join(tail));
            }
        }

        Some(parent.join(relative))
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Moves `from` to `to`, failing if `to` already exists.
///
/// On success the file exists only at `to`. On failure it exists only at
/// `from`, unchanged.
pub fn move_file_exclusive(from: &Path, to: &Path) -> OrganizeResult<()> {
    move_exclusive_with(from, to, |from, to| fs::hard_link(from, to))
}

fn move_exclusive_with(
    from: &Path,
    to: &Path,
    link: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> OrganizeResult<()> {
    match link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(OrganizeError::Collision {
                path: from.to_path_buf(),
                destination: to.to_path_buf(),
            });
        }
        // Cross-device or no hard link support: fall back to a copy.
        Err(_) => copy_exclusive(from, to)?,
    }

    if let Err(e) = fs::remove_file(from) {
        // The source is still complete; drop the new name so the file does
        // not end up in two places.
        return Err(OrganizeError::SourceCleanupFailed {
            path: from.to_path_buf(),
            destination: to.to_path_buf(),
            source: e,
            rollback: fs::remove_file(to).err(),
        });
    }

    Ok(())
}

/// Copies `from` into a newly created `to`. A partial copy is removed.
fn copy_exclusive(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_failure = |e: io::Error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    };

    let mut reader = File::open(from).map_err(move_failure)?;
    let metadata = reader.metadata().map_err(move_failure)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                OrganizeError::Collision {
                    path: from.to_path_buf(),
                    destination: to.to_path_buf(),
                }
            } else {
                move_failure(e)
            }
        })?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|written| {
        if written != metadata.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("copied {} of {} bytes", written, metadata.len()),
            ));
        }
        writer.sync_all()
    });

    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(to);
        return Err(move_failure(e));
    }

    // Best effort: a copy that lost its timestamp is still a complete file.
    let _ = writer.set_permissions(metadata.permissions());
    if let Ok(modified) = metadata.modified() {
        let _ = writer.set_modified(modified);
    }

    Ok(())
}
