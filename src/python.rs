//! Python bindings over a process-wide default [`Preprocessor`].

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::date_normalize;
use crate::error::CoreError;
use crate::pipeline::Preprocessor;
use crate::record::TextRecord;
use crate::severity;

static PREPROCESSOR: Lazy<Preprocessor> = Lazy::new(Preprocessor::default);

impl From<CoreError> for PyErr {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(_) | CoreError::Csv(_) => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Clean raw text: strip emoji/symbols, collapse whitespace, drop stopwords.
#[pyfunction]
#[pyo3(signature = (text=None))]
pub fn clean_text(text: Option<&str>) -> String {
    PREPROCESSOR.cleaner().clean(text)
}

/// Normalize a scraped date string to "DD/MM/YYYY" or "Unknown".
#[pyfunction]
#[pyo3(signature = (raw=None))]
pub fn normalize_date(raw: Option<&str>) -> String {
    date_normalize::normalize_date(raw)
}

/// Canonical names of the places mentioned in text, first-seen order.
#[pyfunction]
pub fn extract_locations(text: &str) -> Vec<String> {
    PREPROCESSOR.gazetteer().extract_all(text)
}

/// Hazard category -> keyword hit count.
#[pyfunction]
pub fn detect_hazards(text: &str) -> BTreeMap<String, usize> {
    PREPROCESSOR.hazards().detect_matches(text)
}

/// Damage and relief category -> keyword hit count.
#[pyfunction]
pub fn detect_impacts(text: &str) -> BTreeMap<String, usize> {
    PREPROCESSOR.impacts().detect_matches(text)
}

/// Add a keyword to an impact category, creating the category if needed.
#[pyfunction]
pub fn add_impact_keyword(category: &str, keyword: &str) -> bool {
    PREPROCESSOR.impacts().add_keyword(category, keyword)
}

/// Replace the impact table with a .json or .toml keyword document.
#[pyfunction]
pub fn load_impact_keywords(path: &str) -> PyResult<()> {
    Ok(PREPROCESSOR.impacts().load(path)?)
}

/// Save the impact table as a .json or .toml keyword document.
#[pyfunction]
pub fn save_impact_keywords(path: &str) -> PyResult<()> {
    Ok(PREPROCESSOR.impacts().save(path)?)
}

/// Severity level ("Low", "Medium", "High" or "Critical") of cleaned text,
/// optionally raised by the post's engagement count.
#[pyfunction]
#[pyo3(signature = (text, engagement=None))]
pub fn severity_from_text(text: &str, engagement: Option<u64>) -> String {
    let cleaned = PREPROCESSOR.cleaner().clean(text);
    let level = match engagement {
        Some(engagement) => severity::severity_with_engagement(&cleaned, engagement),
        None => severity::severity_from_text(&cleaned),
    };
    level.to_string()
}

/// Plan deduplication of one corpus.
///
/// Parameters
/// ----------
/// rows : list[tuple[int, str, str | None]]
///     (id, raw_text, raw_date) in priority order.
///
/// Returns
/// -------
/// tuple[list[tuple[int, str, str]], list[int]]
///     Updates as (id, cleaned_text, normalized_date), then ids to delete.
#[pyfunction]
#[allow(clippy::type_complexity)]
pub fn plan_dedup(rows: Vec<(i64, String, Option<String>)>) -> (Vec<(i64, String, String)>, Vec<i64>) {
    let records: Vec<TextRecord> = rows
        .into_iter()
        .map(|(id, text, date)| TextRecord::new(id, text, date))
        .collect();
    let plan = PREPROCESSOR.plan_dedup(&records);
    let updates = plan
        .to_update
        .into_iter()
        .map(|u| (u.id, u.cleaned_text, u.normalized_date))
        .collect();
    (updates, plan.to_delete)
}

/// Overwrite the date column of CSV data rows start_row..=end_row (1-based).
#[pyfunction]
pub fn fill_date_range_csv(
    source: &str,
    destination: &str,
    start_row: usize,
    end_row: usize,
    date: &str,
) -> PyResult<usize> {
    Ok(date_normalize::fill_date_range_csv(
        source,
        destination,
        start_row,
        end_row,
        date,
    )?)
}
