use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for loading and saving external resources.
///
/// Text operations never produce one of these; only configuration,
/// stopword, keyword-table and CSV I/O can fail.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed TOML document: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("could not serialize TOML document: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported keyword table format: '{}' (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub type Result<T> = std::result::Result<T, CoreError>;
