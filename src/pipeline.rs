//! Pipeline — per-record analysis, corpus reports and dedup planning.
//!
//! raw text → cleaner → (categorizers, gazetteer); raw date → date
//! normalizer. Records are independent of each other here; only the dedup
//! pass needs the whole corpus in order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::categorizer::{
    default_hazard_table, default_impact_table, CategoryDomain, CategoryTable, KeywordCategorizer,
};
use crate::config::CoreConfig;
use crate::date_normalize::normalize_date;
use crate::dedup::{DedupEngine, DedupPlan};
use crate::error::Result;
use crate::gazetteer::Gazetteer;
use crate::record::TextRecord;
use crate::severity::{severity_from_text, Severity};
use crate::text_clean::{Stopwords, TextCleaner};

/// Hazard label when no hazard keyword matches.
pub const UNKNOWN_HAZARD: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedRecord<I> {
    pub id: I,
    pub cleaned_text: String,
    pub normalized_date: String,
    /// First matching hazard in table order, or [`UNKNOWN_HAZARD`].
    pub hazard: String,
    pub hazards: BTreeMap<String, usize>,
    pub severity: Severity,
    pub damage: BTreeMap<String, usize>,
    pub relief: BTreeMap<String, usize>,
    pub locations: Vec<String>,
}

/// Per-record results plus hit counts summed over the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusReport<I> {
    pub records: Vec<AnalyzedRecord<I>>,
    pub hazard_counts: BTreeMap<String, usize>,
    pub damage_counts: BTreeMap<String, usize>,
    pub relief_counts: BTreeMap<String, usize>,
    /// Number of records at each severity level.
    pub severity_counts: BTreeMap<Severity, usize>,
    /// Number of records mentioning each place.
    pub location_counts: BTreeMap<String, usize>,
}

fn accumulate(totals: &mut BTreeMap<String, usize>, counts: &BTreeMap<String, usize>) {
    for (name, hits) in counts {
        *totals.entry(name.clone()).or_insert(0) += hits;
    }
}

#[derive(Debug)]
pub struct Preprocessor {
    cleaner: TextCleaner,
    gazetteer: Gazetteer,
    hazards: KeywordCategorizer,
    impacts: KeywordCategorizer,
    dedup: DedupEngine,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(
            TextCleaner::default(),
            Gazetteer::vietnam(),
            KeywordCategorizer::hazards(),
            KeywordCategorizer::impacts(),
        )
    }
}

impl Preprocessor {
    pub fn new(
        cleaner: TextCleaner,
        gazetteer: Gazetteer,
        hazards: KeywordCategorizer,
        impacts: KeywordCategorizer,
    ) -> Self {
        let dedup = DedupEngine::new(cleaner.clone());
        Self {
            cleaner,
            gazetteer,
            hazards,
            impacts,
            dedup,
        }
    }

    /// Build every component from `config`, loading the files it names.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        let stopwords = match &config.stopwords_path {
            Some(path) => Stopwords::load(path)?,
            None => Stopwords::bundled(),
        };
        let cleaner = TextCleaner::new(stopwords).with_url_stripping(config.strip_urls);

        let hazards = match &config.hazard_keywords_path {
            Some(path) => load_with_defaults(path, default_hazard_table())?,
            None => default_hazard_table(),
        };
        let impacts = match &config.impact_keywords_path {
            Some(path) => load_with_defaults(path, default_impact_table())?,
            None => default_impact_table(),
        };

        Ok(Self {
            dedup: DedupEngine::new(cleaner.clone()).with_drop_empty_text(config.drop_empty_text),
            cleaner,
            gazetteer: Gazetteer::vietnam(),
            hazards: KeywordCategorizer::new(hazards),
            impacts: KeywordCategorizer::new(impacts),
        })
    }

    pub fn cleaner(&self) -> &TextCleaner {
        &self.cleaner
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn hazards(&self) -> &KeywordCategorizer {
        &self.hazards
    }

    pub fn impacts(&self) -> &KeywordCategorizer {
        &self.impacts
    }

    pub fn dedup(&self) -> &DedupEngine {
        &self.dedup
    }

    fn analyze_with<I: Clone>(
        &self,
        record: &TextRecord<I>,
        hazards: &CategoryTable,
        impacts: &CategoryTable,
    ) -> AnalyzedRecord<I> {
        let cleaned = record.cleaned_text(&self.cleaner);
        AnalyzedRecord {
            id: record.id.clone(),
            normalized_date: normalize_date(record.raw_date.as_deref()),
            hazard: hazards
                .primary_category(&cleaned)
                .unwrap_or(UNKNOWN_HAZARD)
                .to_string(),
            hazards: hazards.detect_matches(&cleaned),
            severity: severity_from_text(&cleaned),
            damage: impacts.detect_matches_in_domain(&cleaned, CategoryDomain::Damage),
            relief: impacts.detect_matches_in_domain(&cleaned, CategoryDomain::Relief),
            locations: self.gazetteer.extract_all(&cleaned),
            cleaned_text: cleaned,
        }
    }

    /// Clean, classify, locate and date one record.
    pub fn analyze<I: Clone>(&self, record: &TextRecord<I>) -> AnalyzedRecord<I> {
        self.analyze_with(record, &self.hazards.snapshot(), &self.impacts.snapshot())
    }

    /// Analyze every record against one snapshot of the category tables.
    pub fn analyze_corpus<I: Clone>(&self, records: &[TextRecord<I>]) -> CorpusReport<I> {
        let hazards = self.hazards.snapshot();
        let impacts = self.impacts.snapshot();

        let mut report = CorpusReport {
            records: Vec::with_capacity(records.len()),
            hazard_counts: BTreeMap::new(),
            damage_counts: BTreeMap::new(),
            relief_counts: BTreeMap::new(),
            severity_counts: BTreeMap::new(),
            location_counts: BTreeMap::new(),
        };
        for record in records {
            let analyzed = self.analyze_with(record, &hazards, &impacts);
            accumulate(&mut report.hazard_counts, &analyzed.hazards);
            accumulate(&mut report.damage_counts, &analyzed.damage);
            accumulate(&mut report.relief_counts, &analyzed.relief);
            *report.severity_counts.entry(analyzed.severity).or_insert(0) += 1;
            for location in &analyzed.locations {
                *report.location_counts.entry(location.clone()).or_insert(0) += 1;
            }
            report.records.push(analyzed);
        }

        info!(
            records = report.records.len(),
            hazards = report.hazard_counts.len(),
            locations = report.location_counts.len(),
            "Corpus analyzed"
        );
        report
    }

    /// Plan deduplication of one disaster's corpus.
    pub fn plan_dedup<I: Clone>(&self, records: &[TextRecord<I>]) -> DedupPlan<I> {
        self.dedup.plan(records)
    }
}

fn load_with_defaults(path: &Path, defaults: CategoryTable) -> Result<CategoryTable> {
    let mut table = CategoryTable::load(path, defaults.default_domain())?;
    table.inherit_metadata(&defaults);
    Ok(table)
}
