use datesort::cli::{SortCommand, SortOptions, run_cli};
use datesort::file_organizer::OrganizeError;
/// Integration tests for datesort
///
/// These tests run complete sorts over temporary trees, using real JPEG bytes
/// with an embedded EXIF capture date.
///
/// Test categories:
/// 1. Copy mode
/// 2. In-place reorganization
/// 3. Safety: collisions and unreadable metadata
/// 4. Directory pruning
/// 5. Raw file policy
/// 6. Dry run and configuration
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary directory tree.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file (and its parent directories) with content.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.path().join(rel_path);
        fs::create_dir_all(file_path.parent().unwrap()).expect("Failed to create directories");
        fs::write(&file_path, content).expect("Failed to write file content");
    }

    /// Create a photo whose EXIF capture date is `date` (`YYYY:MM:DD HH:MM:SS`).
    fn create_photo(&self, rel_path: &str, date: &str) {
        self.create_file(rel_path, &jpeg_taken_at(date));
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    fn read(&self, rel_path: &str) -> Vec<u8> {
        fs::read(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Should not exist: {}", path.display());
    }

    /// All files below the fixture root, relative and sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        let mut files: Vec<PathBuf> = files
            .into_iter()
            .map(|p| p.strip_prefix(self.path()).unwrap().to_path_buf())
            .collect();
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    fn in_place(&self, rel_root: &str) -> SortCommand {
        SortCommand::InPlace {
            root: self.path().join(rel_root),
        }
    }

    fn copy(&self, rel_source: &str, rel_destination: &str) -> SortCommand {
        SortCommand::Copy {
            source: self.path().join(rel_source),
            destination: self.path().join(rel_destination),
        }
    }
}

// ============================================================================
// Test Data: JPEG with EXIF
// ============================================================================

/// Minimal JPEG: SOI, an APP1 Exif segment whose IFD0 points to an Exif IFD
/// holding `DateTimeOriginal`, then EOI.
fn jpeg_taken_at(date: &str) -> Vec<u8> {
    let mut tiff: Vec<u8> = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());

    // IFD0 at 8: one entry, ExifIFDPointer -> 26
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    // Exif IFD at 26: one entry, DateTimeOriginal -> 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut value = date.as_bytes().to_vec();
    value.resize(20, 0);
    tiff.extend_from_slice(&value);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

const JULY_4TH: &str = "2023:07:04 10:00:00";

// ============================================================================
// Test Suite 1: Copy Mode
// ============================================================================

#[test]
fn test_copy_mode_moves_into_dated_folder() {
    let fixture = TestFixture::new();
    fixture.create_photo("inbox/IMG_0001.JPG", JULY_4TH);
    let original = fixture.read("inbox/IMG_0001.JPG");

    let report = run_cli(fixture.copy("inbox", "Photos"), &SortOptions::default())
        .expect("run should succeed");

    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists("Photos/2023-07-04/IMG_0001.JPG");
    fixture.assert_not_exists("inbox/IMG_0001.JPG");
    assert_eq!(fixture.read("Photos/2023-07-04/IMG_0001.JPG"), original);
}

#[test]
fn test_copy_mode_walks_nested_source_and_keeps_source_dirs() {
    let fixture = TestFixture::new();
    fixture.create_photo("inbox/card1/DCIM/a.jpg", "2021:05:01 08:00:00");
    fixture.create_photo("inbox/card2/b.jpg", "2021:05:02 09:30:00");
    fixture.create_photo("inbox/c.jpg", "2021:05:01 18:00:00");

    let report = run_cli(fixture.copy("inbox", "sorted"), &SortOptions::default()).unwrap();

    assert_eq!(report.moved.len(), 3);
    assert!(report.pruned.is_empty(), "copy mode never prunes");
    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("sorted/2021-05-01/a.jpg"),
            PathBuf::from("sorted/2021-05-01/c.jpg"),
            PathBuf::from("sorted/2021-05-02/b.jpg"),
        ]
    );
    assert!(fixture.path().join("inbox/card1/DCIM").is_dir());
}

#[test]
fn test_copy_mode_is_resumable() {
    let fixture = TestFixture::new();
    fixture.create_photo("inbox/a.jpg", JULY_4TH);

    run_cli(fixture.copy("inbox", "sorted"), &SortOptions::default()).unwrap();
    fixture.create_photo("inbox/b.jpg", JULY_4TH);
    let report = run_cli(fixture.copy("inbox", "sorted"), &SortOptions::default()).unwrap();

    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists("sorted/2023-07-04/a.jpg");
    fixture.assert_file_exists("sorted/2023-07-04/b.jpg");
}

// ============================================================================
// Test Suite 2: In-Place Reorganization
// ============================================================================

#[test]
fn test_in_place_skips_file_already_sorted() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/2023-07-04/IMG_0001.JPG", JULY_4TH);

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(
        report.skipped,
        vec![fixture.path().join("library/2023-07-04/IMG_0001.JPG")]
    );
    assert!(report.moved.is_empty());
    fixture.assert_file_exists("library/2023-07-04/IMG_0001.JPG");
}

#[test]
fn test_in_place_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/a.jpg", "2020:01:01 00:00:00");
    fixture.create_photo("library/trip/b.jpg", "2020:01:02 00:00:00");
    fixture.create_photo("library/2019-12-31/c.jpg", "2020:01:03 00:00:00");

    let first = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();
    let after_first = fixture.list_files_recursive();
    let second = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(first.moved.len(), 3);
    assert!(second.moved.is_empty(), "second run must not move anything");
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(fixture.list_files_recursive(), after_first);
    assert_eq!(
        after_first,
        vec![
            PathBuf::from("library/2019-12-31/2020-01-03/c.jpg"),
            PathBuf::from("library/2020-01-01/a.jpg"),
            PathBuf::from("library/trip/2020-01-02/b.jpg"),
        ]
    );
}

#[test]
fn test_in_place_suffix_match_is_not_sorted() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/party-2023-07-04/a.jpg", JULY_4TH);

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists("library/party-2023-07-04/2023-07-04/a.jpg");
}

// ============================================================================
// Test Suite 3: Safety
// ============================================================================

#[test]
fn test_file_without_metadata_stays_put() {
    let fixture = TestFixture::new();
    fixture.create_file("library/notes.txt", b"not a photo");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].1,
        OrganizeError::MetadataUnavailable { .. }
    ));
    fixture.assert_file_exists("library/notes.txt");
}

#[test]
fn test_collision_never_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_photo("inbox/IMG_0001.JPG", JULY_4TH);
    fixture.create_file("sorted/2023-07-04/IMG_0001.JPG", b"the one already sorted");
    let incoming = fixture.read("inbox/IMG_0001.JPG");

    let report = run_cli(fixture.copy("inbox", "sorted"), &SortOptions::default()).unwrap();

    assert!(matches!(
        report.failed.as_slice(),
        [(_, OrganizeError::Collision { .. })]
    ));
    assert_eq!(fixture.read("inbox/IMG_0001.JPG"), incoming);
    assert_eq!(
        fixture.read("sorted/2023-07-04/IMG_0001.JPG"),
        b"the one already sorted"
    );
}

#[test]
fn test_every_file_ends_in_exactly_one_place() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/x/a.jpg", "2022:02:02 02:02:02");
    fixture.create_photo("library/x/b.jpg", "2022:02:03 02:02:02");
    fixture.create_file("library/x/c.dat", b"no exif");
    fixture.create_photo("library/y/a.jpg", "2022:02:02 02:02:02");

    run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("library/x/2022-02-02/a.jpg"),
            PathBuf::from("library/x/2022-02-03/b.jpg"),
            PathBuf::from("library/x/c.dat"),
            PathBuf::from("library/y/2022-02-02/a.jpg"),
        ]
    );
}

// ============================================================================
// Test Suite 4: Directory Pruning
// ============================================================================

#[test]
fn test_in_place_prunes_emptied_directories_only() {
    let fixture = TestFixture::new();
    fixture.create_subdir("library/2022-01-01");
    fixture.create_photo("library/2022-01-02/keep.jpg", "2022:01:02 12:00:00");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(report.pruned, vec![fixture.path().join("library/2022-01-01")]);
    fixture.assert_not_exists("library/2022-01-01");
    fixture.assert_file_exists("library/2022-01-02/keep.jpg");
}

#[test]
fn test_directory_with_failed_file_is_kept() {
    let fixture = TestFixture::new();
    fixture.create_file("library/old/broken.jpg", b"\xFF\xD8 truncated");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.pruned.is_empty());
    fixture.assert_file_exists("library/old/broken.jpg");
}

#[test]
fn test_in_place_run_stays_inside_named_directory() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/2023-07-04/RAW/DSC_0001.ARW", JULY_4TH);

    let report = run_cli(
        fixture.in_place("library/2023-07-04/RAW"),
        &SortOptions::default(),
    )
    .unwrap();

    assert_eq!(report.moved.len(), 1);
    fixture.assert_not_exists("library/2023-07-04/DSC_0001.ARW");
    fixture.assert_file_exists("library/2023-07-04/RAW/2023-07-04/DSC_0001.ARW");
}

#[test]
fn test_root_is_never_pruned() {
    let fixture = TestFixture::new();
    fixture.create_subdir("library");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert!(report.pruned.is_empty());
    assert!(fixture.path().join("library").is_dir());
}

// ============================================================================
// Test Suite 5: Raw File Policy
// ============================================================================

#[test]
fn test_switching_raw_policy_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("library/DSC_0001.ARW", &jpeg_taken_at(JULY_4TH));
    fixture.create_photo("library/DSC_0001.JPG", JULY_4TH);

    let separate = SortOptions {
        separate_raw: true,
        ..Default::default()
    };
    run_cli(fixture.in_place("library"), &separate).unwrap();
    fixture.assert_file_exists("library/2023-07-04/RAW/DSC_0001.ARW");
    fixture.assert_file_exists("library/2023-07-04/DSC_0001.JPG");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();
    assert_eq!(report.moved.len(), 1);
    assert_eq!(
        report.pruned,
        vec![fixture.path().join("library/2023-07-04/RAW")]
    );
    fixture.assert_file_exists("library/2023-07-04/DSC_0001.ARW");
    fixture.assert_file_exists("library/2023-07-04/DSC_0001.JPG");
}

// ============================================================================
// Test Suite 6: Dry Run and Configuration
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/a.jpg", JULY_4TH);
    fixture.create_subdir("library/empty");
    let before = fixture.list_files_recursive();

    let options = SortOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = run_cli(fixture.in_place("library"), &options).unwrap();

    assert_eq!(report.planned.len(), 1);
    assert!(report.moved.is_empty());
    assert!(report.pruned.is_empty());
    assert_eq!(fixture.list_files_recursive(), before);
    assert!(fixture.path().join("library/empty").is_dir());
}

#[test]
fn test_config_file_policy_and_filters() {
    let fixture = TestFixture::new();
    fixture.create_file(
        "datesort.toml",
        br#"
[policy]
raw = "separate"
raw_folder = "ARW"

[filters]
skip_hidden_files = true

[filters.exclude]
extensions = ["xmp"]
"#,
    );
    fixture.create_file("inbox/DSC_0001.ARW", &jpeg_taken_at(JULY_4TH));
    fixture.create_file("inbox/DSC_0001.xmp", b"<x:xmpmeta/>");
    fixture.create_file("inbox/.hidden.jpg", &jpeg_taken_at(JULY_4TH));

    let options = SortOptions {
        config_path: Some(fixture.path().join("datesort.toml")),
        ..Default::default()
    };
    let report = run_cli(fixture.copy("inbox", "sorted"), &options).unwrap();

    assert_eq!(report.total_processed(), 1);
    assert!(report.is_complete_success());
    fixture.assert_file_exists("sorted/2023-07-04/ARW/DSC_0001.ARW");
    fixture.assert_file_exists("inbox/DSC_0001.xmp");
    fixture.assert_file_exists("inbox/.hidden.jpg");
}

#[test]
fn test_hidden_files_are_visited_by_default() {
    let fixture = TestFixture::new();
    fixture.create_photo("library/.IMG_0001.JPG", JULY_4TH);
    fixture.create_file("library/.notes", b"no exif");

    let report = run_cli(fixture.in_place("library"), &SortOptions::default()).unwrap();

    assert_eq!(report.total_processed(), 2);
    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_complete_success());
    fixture.assert_file_exists("library/2023-07-04/.IMG_0001.JPG");
    fixture.assert_file_exists("library/.notes");
}

#[test]
fn test_invalid_source_is_rejected_before_any_io() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", &jpeg_taken_at(JULY_4TH));

    let result = run_cli(fixture.in_place("photo.jpg"), &SortOptions::default());

    assert!(result.is_err());
    fixture.assert_file_exists("photo.jpg");
    assert_eq!(
        fixture.list_files_recursive(),
        vec![PathBuf::from("photo.jpg")]
    );
}
