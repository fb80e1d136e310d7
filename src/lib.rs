//! datesort - sort photos and videos into date-named folders
//!
//! This library reads the capture date embedded in each media file, resolves
//! the `YYYY-MM-DD` folder it belongs in, and moves it there without ever
//! overwriting or losing a file. Trees can be sorted in place or moved into a
//! separate destination tree.

pub mod capture_time;
pub mod cli;
pub mod config;
pub mod date_folder;
pub mod file_organizer;
pub mod output;
pub mod report;
pub mod tree_walker;

pub use capture_time::{CaptureTimeSource, ExifReader};
pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use date_folder::{DestinationFolder, RawPolicy, SortPolicy};
pub use file_organizer::{FileOrganizer, OrganizeError, ProcessingOutcome};
pub use report::SortReport;
pub use tree_walker::{TreeWalker, Visitor, WalkError};

pub use cli::{ArgumentError, CliArgs, SortCommand, SortOptions, run_cli};
