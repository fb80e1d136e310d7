/// Capture timestamp extraction from embedded EXIF metadata.
///
/// Only the original-capture field (`DateTimeOriginal`) is considered. Container
/// formats may embed several IFDs (thumbnail and preview blocks first, primary
/// data last), so when the field appears more than once the last occurrence wins.
use chrono::{NaiveDate, NaiveDateTime};
use exif::{Field, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A source of capture timestamps.
///
/// `None` means the file carries no usable timestamp. That is an ordinary
/// outcome for screenshots, stripped images and unsupported formats.
pub trait CaptureTimeSource {
    fn read_capture_time(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Reads `DateTimeOriginal` through `kamadak-exif`.
///
/// Supports every container the crate understands: JPEG, TIFF-based raw
/// formats (ARW, DNG, NEF, ...), HEIF, PNG and WebP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl CaptureTimeSource for ExifReader {
    fn read_capture_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let file = File::open(path).ok()?;
        let mut buffer = BufReader::new(file);
        let exif = Reader::new().read_from_container(&mut buffer).ok()?;

        let field = exif
            .fields()
            .filter(|field| field.tag == Tag::DateTimeOriginal)
            .last()?;
        field_to_datetime(field)
    }
}

/// Converts an EXIF ASCII date field (`YYYY:MM:DD HH:MM:SS`) to a calendar date/time.
///
/// The value is taken as-is: no timezone conversion is applied, even when an
/// offset tag is present.
fn field_to_datetime(field: &Field) -> Option<NaiveDateTime> {
    let Value::Ascii(ref values) = field.value else {
        return None;
    };
    let raw = values.first()?;
    let parsed = exif::DateTime::from_ascii(raw).ok()?;

    NaiveDate::from_ymd_opt(
        i32::from(parsed.year),
        u32::from(parsed.month),
        u32::from(parsed.day),
    )?
    .and_hms_opt(
        u32::from(parsed.hour),
        u32::from(parsed.minute),
        u32::from(parsed.second),
    )
}
