//! Date normalization — heterogeneous scraped date strings to `DD/MM/YYYY`.
//!
//! Each recognized shape is a regex plus the capture-group positions of its
//! day, month and year. Shapes are tried in a fixed priority order and the
//! first structural match wins; anything else becomes [`UNKNOWN_DATE`].

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::record::TextRecord;

/// Sentinel returned when no date shape matches.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Output format for every normalized date.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// The date layouts seen in scraped news and comment metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `Thứ bảy, 28/9/2024, 14:00 (GMT+7)`
    VietnameseWeekday,
    /// `2024-09-07T15:23:00Z`, also date-only `2024-09-07`
    IsoTimestamp,
    /// `15-08-2025`
    DayMonthYearDash,
    /// `1/2/2023`
    DayMonthYearSlash,
}

struct ShapeMatcher {
    shape: DateShape,
    pattern: Regex,
    // capture group indices
    day: usize,
    month: usize,
    year: usize,
}

impl ShapeMatcher {
    fn new(shape: DateShape, pattern: &str, day: usize, month: usize, year: usize) -> Self {
        Self {
            shape,
            pattern: Regex::new(pattern).unwrap(),
            day,
            month,
            year,
        }
    }

    /// Day, month and year if the pattern matches structurally.
    fn extract(&self, raw: &str) -> Option<(u32, u32, i32)> {
        let caps = self.pattern.captures(raw)?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str());
        Some((
            field(self.day)?.parse().ok()?,
            field(self.month)?.parse().ok()?,
            field(self.year)?.parse().ok()?,
        ))
    }
}

// Priority order. Adding a shape is one entry here.
static DATE_SHAPES: Lazy<Vec<ShapeMatcher>> = Lazy::new(|| {
    vec![
        ShapeMatcher::new(
            DateShape::VietnameseWeekday,
            r"(?i)(?:thứ\s+(?:hai|ba|tư|năm|sáu|bảy|[2-7])|chủ\s+nhật)\s*,\s*(\d{1,2})/(\d{1,2})/(\d{4})\b",
            1,
            2,
            3,
        ),
        ShapeMatcher::new(
            DateShape::IsoTimestamp,
            r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:\b|T)",
            3,
            2,
            1,
        ),
        ShapeMatcher::new(
            DateShape::DayMonthYearDash,
            r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b",
            1,
            2,
            3,
        ),
        ShapeMatcher::new(
            DateShape::DayMonthYearSlash,
            r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b",
            1,
            2,
            3,
        ),
    ]
});

/// A successfully parsed date together with the shape that matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub shape: DateShape,
}

impl ParsedDate {
    pub fn to_canonical(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Parse `raw` against the known shapes.
///
/// Returns `None` when no shape matches, or when the first matching shape
/// names an impossible calendar day (e.g. `31/02/2024`).
pub fn parse_date(raw: Option<&str>) -> Option<ParsedDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let (matcher, (day, month, year)) = DATE_SHAPES
        .iter()
        .find_map(|m| m.extract(raw).map(|fields| (m, fields)))?;

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Some(ParsedDate {
            date,
            shape: matcher.shape,
        }),
        None => {
            debug!(raw, shape = ?matcher.shape, "Date shape matched but calendar day is invalid");
            None
        }
    }
}

/// Normalize `raw` to `DD/MM/YYYY`, or [`UNKNOWN_DATE`].
pub fn normalize_date<'a>(raw: impl Into<Option<&'a str>>) -> String {
    match parse_date(raw.into()) {
        Some(parsed) => parsed.to_canonical(),
        None => UNKNOWN_DATE.to_string(),
    }
}

// ── Manual repair ───────────────────────────────────────────────────

/// Overwrite the date of rows `start_row..=end_row` (1-based) with `date`.
///
/// The caller asserts the range is right; rows outside the slice are
/// ignored. Returns the number of rows touched.
pub fn fill_date_range<I>(
    records: &mut [TextRecord<I>],
    start_row: usize,
    end_row: usize,
    date: &str,
) -> usize {
    let mut touched = 0;
    for (idx, record) in records.iter_mut().enumerate() {
        let row = idx + 1;
        if row >= start_row && row <= end_row {
            record.raw_date = Some(date.to_string());
            touched += 1;
        }
    }
    touched
}

/// CSV variant of [`fill_date_range`]: rewrite the first column of data rows
/// `start_row..=end_row` (1-based, header excluded) and write the result to
/// `destination`, which may be the same file as `source`.
pub fn fill_date_range_csv(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    start_row: usize,
    end_row: usize,
    date: &str,
) -> Result<usize> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(File::open(source)?);
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<csv::StringRecord>, csv::Error>>()?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(destination)?;
    let mut touched = 0;
    for (idx, row) in rows.iter().enumerate() {
        // idx 0 is the header and is never rewritten
        if idx >= start_row.max(1) && idx <= end_row && !row.is_empty() {
            let mut fields: Vec<&str> = row.iter().collect();
            fields[0] = date;
            writer.write_record(&fields)?;
            touched += 1;
        } else {
            writer.write_record(row)?;
        }
    }
    writer.flush()?;

    info!(
        source = %source.display(),
        destination = %destination.display(),
        start_row,
        end_row,
        date,
        touched,
        "Filled date range"
    );
    Ok(touched)
}
