//! Destination folder resolution for dated media files.
//!
//! Maps a capture timestamp to its canonical `YYYY-MM-DD` folder and, when the
//! policy asks for it, a nested sub-folder for raw sensor files.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use datesort::date_folder::SortPolicy;
//!
//! let taken = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let folder = SortPolicy::default().resolve(taken, "IMG_0001.JPG");
//! assert_eq!(folder.to_string(), "2023-07-04");
//! ```

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Locale-invariant date pattern used for every destination folder.
const DATE_FORMAT: &str = "%Y-%m-%d";

const DEFAULT_RAW_EXTENSIONS: &[&str] = &[
    "arw", "cr2", "cr3", "nef", "nrw", "dng", "orf", "rw2", "raf", "pef", "srw", "raw",
];

/// How raw files are placed relative to the other files of the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawPolicy {
    /// Raw and processed images share one folder per day.
    #[default]
    Shared,
    /// Raw files go to a sub-folder of the day folder.
    Separate,
}

/// Layout policy selected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SortPolicy {
    #[serde(default)]
    pub raw: RawPolicy,

    /// Sub-folder name used for raw files under [`RawPolicy::Separate`].
    #[serde(default = "default_raw_folder")]
    pub raw_folder: String,

    /// Extensions (case-insensitive, without the dot) treated as raw.
    #[serde(default = "default_raw_extensions")]
    pub raw_extensions: HashSet<String>,

    /// Folder names an in-place run folds back into their day folder,
    /// e.g. `Video` in `2023-07-04/Video/clip.mp4`.
    #[serde(default)]
    pub collapse_folders: Vec<String>,
}

fn default_raw_folder() -> String {
    "RAW".to_string()
}

fn default_raw_extensions() -> HashSet<String> {
    DEFAULT_RAW_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

impl Default for SortPolicy {
    fn default() -> Self {
        Self {
            raw: RawPolicy::default(),
            raw_folder: default_raw_folder(),
            raw_extensions: default_raw_extensions(),
            collapse_folders: Vec::new(),
        }
    }
}

impl SortPolicy {
    /// Returns true if the file name carries a raw extension.
    pub fn is_raw(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .map(|ext| {
                self.raw_extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
            .unwrap_or(false)
    }

    /// Computes the relative destination folder for a file.
    ///
    /// Pure and deterministic: the timestamp is formatted as-is with a fixed
    /// pattern, so neither host locale nor timezone can change the result.
    pub fn resolve(&self, taken: NaiveDateTime, file_name: &str) -> DestinationFolder {
        let mut segments = vec![taken.format(DATE_FORMAT).to_string()];
        if self.raw == RawPolicy::Separate && self.is_raw(file_name) {
            segments.push(self.raw_folder.clone());
        }
        DestinationFolder { segments }
    }

    /// Folder names that may be stripped from the end of a parent path when
    /// looking for the file's day folder during an in-place run.
    pub(crate) fn collapsible(&self, folder: &DestinationFolder) -> Vec<&str> {
        let mut names: Vec<&str> = self.collapse_folders.iter().map(String::as_str).collect();
        if !folder.segments().iter().any(|s| s == &self.raw_folder) {
            names.push(&self.raw_folder);
        }
        names
    }
}

/// A relative destination such as `2023-07-04` or `2023-07-04/RAW`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationFolder {
    segments: Vec<String>,
}

impl DestinationFolder {
    /// The folder's path components, day folder first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The day folder name (`YYYY-MM-DD`).
    pub fn date(&self) -> &str {
        // `resolve` is the only constructor and always pushes the day first.
        &self.segments[0]
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for DestinationFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
