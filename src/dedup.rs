//! Deduplication — exact matching on cleaned text within one corpus.
//!
//! Rows are visited in the order given. The first row carrying a cleaned
//! text survives and gets its date normalized; every later row with the same
//! cleaned text is deleted. The dedup scope is one disaster's corpus, never
//! several at once.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use thiserror::Error;
use tracing::{debug, info};

use crate::record::TextRecord;
use crate::text_clean::TextCleaner;

/// Update action for a surviving row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate<I> {
    pub id: I,
    pub cleaned_text: String,
    pub normalized_date: String,
}

/// The survivor and the duplicates of one distinct cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupDecision<I> {
    pub keep_id: I,
    pub drop_ids: Vec<I>,
}

/// Batched result of one dedup pass. `to_update` and `to_delete` are
/// disjoint; both keep input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupPlan<I> {
    pub to_update: Vec<RecordUpdate<I>>,
    pub to_delete: Vec<I>,
    /// One entry per distinct non-empty cleaned text, in first-seen order.
    pub groups: Vec<DedupDecision<I>>,
}

impl<I> Default for DedupPlan<I> {
    fn default() -> Self {
        Self {
            to_update: Vec::new(),
            to_delete: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Storage collaborator that receives a plan.
///
/// `apply_updates` must apply the whole batch or none of it.
pub trait RecordStore<I> {
    type Error: std::error::Error + 'static;

    fn apply_updates(&mut self, updates: &[RecordUpdate<I>]) -> Result<(), Self::Error>;

    fn apply_deletes(&mut self, ids: &[I]) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum ApplyError<E: std::error::Error + 'static> {
    #[error("applying {count} survivor updates failed; no rows were deleted")]
    Updates {
        count: usize,
        #[source]
        source: E,
    },
    #[error("deleting {count} duplicate rows failed after updates were applied")]
    Deletes {
        count: usize,
        #[source]
        source: E,
    },
}

impl<I> DedupPlan<I> {
    pub fn kept(&self) -> usize {
        self.to_update.len()
    }

    pub fn dropped(&self) -> usize {
        self.to_delete.len()
    }

    /// Normalized date per surviving id.
    pub fn update_dates(&self) -> impl Iterator<Item = (&I, &str)> {
        self.to_update
            .iter()
            .map(|u| (&u.id, u.normalized_date.as_str()))
    }

    /// Hand the plan to `store`: all updates first, then all deletes.
    /// Deletes are never attempted if the updates failed.
    pub fn apply<S: RecordStore<I>>(&self, store: &mut S) -> Result<(), ApplyError<S::Error>> {
        if !self.to_update.is_empty() {
            debug!(count = self.to_update.len(), "Applying survivor updates");
            store
                .apply_updates(&self.to_update)
                .map_err(|source| ApplyError::Updates {
                    count: self.to_update.len(),
                    source,
                })?;
        }
        if !self.to_delete.is_empty() {
            debug!(count = self.to_delete.len(), "Deleting duplicates");
            store
                .apply_deletes(&self.to_delete)
                .map_err(|source| ApplyError::Deletes {
                    count: self.to_delete.len(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// In-memory store: survivors take their cleaned text and normalized date,
/// duplicates are removed.
impl<I: PartialEq> RecordStore<I> for Vec<TextRecord<I>> {
    type Error = Infallible;

    fn apply_updates(&mut self, updates: &[RecordUpdate<I>]) -> Result<(), Self::Error> {
        for update in updates {
            if let Some(record) = self.iter_mut().find(|r| r.id == update.id) {
                record.raw_text = update.cleaned_text.clone();
                record.raw_date = Some(update.normalized_date.clone());
            }
        }
        Ok(())
    }

    fn apply_deletes(&mut self, ids: &[I]) -> Result<(), Self::Error> {
        self.retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

/// Plans keep/drop actions for a corpus.
#[derive(Debug, Clone)]
pub struct DedupEngine {
    cleaner: TextCleaner,
    drop_empty_text: bool,
}

impl Default for DedupEngine {
    fn default() -> Self {
        Self::new(TextCleaner::default())
    }
}

impl DedupEngine {
    pub fn new(cleaner: TextCleaner) -> Self {
        Self {
            cleaner,
            drop_empty_text: true,
        }
    }

    /// When set (the default), rows whose cleaned text is empty are deleted
    /// instead of competing for a survivor slot.
    pub fn with_drop_empty_text(mut self, drop_empty_text: bool) -> Self {
        self.drop_empty_text = drop_empty_text;
        self
    }

    pub fn cleaner(&self) -> &TextCleaner {
        &self.cleaner
    }

    /// Plan one corpus. Rows must be in priority order (usually id order).
    pub fn plan<I: Clone>(&self, records: &[TextRecord<I>]) -> DedupPlan<I> {
        let mut plan = DedupPlan::default();
        // cleaned text -> index into plan.groups
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut empty_dropped = 0usize;

        for record in records {
            let cleaned = record.cleaned_text(&self.cleaner);

            if cleaned.is_empty() && self.drop_empty_text {
                plan.to_delete.push(record.id.clone());
                empty_dropped += 1;
                continue;
            }

            match seen.get(&cleaned) {
                Some(&group) => {
                    plan.groups[group].drop_ids.push(record.id.clone());
                    plan.to_delete.push(record.id.clone());
                }
                None => {
                    seen.insert(cleaned.clone(), plan.groups.len());
                    plan.groups.push(DedupDecision {
                        keep_id: record.id.clone(),
                        drop_ids: Vec::new(),
                    });
                    plan.to_update.push(RecordUpdate {
                        id: record.id.clone(),
                        cleaned_text: cleaned,
                        normalized_date: record.normalized_date(),
                    });
                }
            }
        }

        info!(
            rows = records.len(),
            kept = plan.kept(),
            dropped = plan.dropped(),
            empty_dropped,
            "Deduplication planned"
        );
        plan
    }

    /// Plan each partition (e.g. each disaster) independently. Rows keep
    /// their relative order within a partition.
    pub fn plan_partitioned<K, I, R>(&self, records: R) -> BTreeMap<K, DedupPlan<I>>
    where
        K: Ord,
        I: Clone,
        R: IntoIterator<Item = (K, TextRecord<I>)>,
    {
        let mut partitions: BTreeMap<K, Vec<TextRecord<I>>> = BTreeMap::new();
        for (key, record) in records {
            partitions.entry(key).or_default().push(record);
        }
        partitions
            .into_iter()
            .map(|(key, rows)| {
                let plan = self.plan(&rows);
                (key, plan)
            })
            .collect()
    }
}
