//! Records handed over by the storage collaborator.

use serde::{Deserialize, Serialize};

use crate::date_normalize::normalize_date;
use crate::text_clean::TextCleaner;

/// One scraped article or comment. `id` is opaque to the core and only
/// used to report which rows to keep or drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord<I = i64> {
    pub id: I,
    pub raw_text: String,
    #[serde(default)]
    pub raw_date: Option<String>,
}

impl<I> TextRecord<I> {
    pub fn new(id: I, raw_text: impl Into<String>, raw_date: Option<String>) -> Self {
        Self {
            id,
            raw_text: raw_text.into(),
            raw_date,
        }
    }

    pub fn cleaned_text(&self, cleaner: &TextCleaner) -> String {
        cleaner.clean(self.raw_text.as_str())
    }

    pub fn normalized_date(&self) -> String {
        normalize_date(self.raw_date.as_deref())
    }
}
