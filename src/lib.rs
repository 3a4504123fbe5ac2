//! Text core for the disaster-relief corpus.
//!
//! Turns noisy scraped Vietnamese/English news and comments into clean,
//! categorized, deduplicated records:
//! 1. Text cleaning (emoji/symbol stripping, whitespace, stopwords)
//! 2. Date normalization to `DD/MM/YYYY`
//! 3. Location extraction from a gazetteer of provinces and cities
//! 4. Keyword categorization (hazard type, damage and relief needs) and
//!    severity rating
//! 5. Exact deduplication on cleaned text within one disaster's corpus
//!
//! Everything is deterministic substring/lookup matching. Storage, crawling
//! and CLI entry points live with the host application.

pub mod categorizer;
pub mod config;
pub mod date_normalize;
pub mod dedup;
pub mod error;
pub mod gazetteer;
pub mod pipeline;
pub mod record;
pub mod severity;
pub mod text_clean;

#[cfg(feature = "python")]
mod python;

pub use categorizer::{
    default_hazard_table, default_impact_table, Category, CategoryCommand, CategoryDomain,
    CategoryTable, KeywordCategorizer, KeywordDocument,
};
pub use config::CoreConfig;
pub use date_normalize::{
    fill_date_range, fill_date_range_csv, normalize_date, parse_date, DateShape, ParsedDate,
    UNKNOWN_DATE,
};
pub use dedup::{ApplyError, DedupDecision, DedupEngine, DedupPlan, RecordStore, RecordUpdate};
pub use error::{CoreError, Result};
pub use gazetteer::{AdminLevel, Gazetteer, GazetteerEntry, OverlapPolicy};
pub use pipeline::{AnalyzedRecord, CorpusReport, Preprocessor, UNKNOWN_HAZARD};
pub use record::TextRecord;
pub use severity::{severity_from_text, severity_with_engagement, Severity};
pub use text_clean::{Stopwords, TextCleaner};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Native extension module for the host application.
#[cfg(feature = "python")]
#[pymodule]
fn relief_text_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Cleaning and dates
    m.add_function(wrap_pyfunction!(python::clean_text, m)?)?;
    m.add_function(wrap_pyfunction!(python::normalize_date, m)?)?;
    m.add_function(wrap_pyfunction!(python::fill_date_range_csv, m)?)?;

    // Locations and categories
    m.add_function(wrap_pyfunction!(python::extract_locations, m)?)?;
    m.add_function(wrap_pyfunction!(python::detect_hazards, m)?)?;
    m.add_function(wrap_pyfunction!(python::detect_impacts, m)?)?;
    m.add_function(wrap_pyfunction!(python::add_impact_keyword, m)?)?;
    m.add_function(wrap_pyfunction!(python::load_impact_keywords, m)?)?;
    m.add_function(wrap_pyfunction!(python::save_impact_keywords, m)?)?;
    m.add_function(wrap_pyfunction!(python::severity_from_text, m)?)?;

    // Deduplication
    m.add_function(wrap_pyfunction!(python::plan_dedup, m)?)?;

    Ok(())
}
