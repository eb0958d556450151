//! Duplicate analysis of pack entries against a tenant corpus
//!
//! Each candidate is looked up by trigger (against existing triggers and
//! aliases) and then by title. Keys are trimmed and lowercased. Candidates
//! are only ever compared with the existing corpus, never with each other.

use serde::Serialize;
use std::collections::HashMap;

use super::{PackEntry, TenantEntry};

/// Outcome of comparing a candidate with the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CandidateStatus {
    New,
    #[serde(rename_all = "camelCase")]
    Duplicate { matched_tenant_entry_id: String },
}

/// A pack entry annotated for one install session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    pub entry: PackEntry,
    #[serde(flatten)]
    pub status: CandidateStatus,
    pub selected: bool,
}

impl CandidateEntry {
    pub fn is_duplicate(&self) -> bool {
        matches!(self.status, CandidateStatus::Duplicate { .. })
    }

    /// Id of the existing entry this candidate would replace
    pub fn matched_tenant_entry_id(&self) -> Option<&str> {
        match &self.status {
            CandidateStatus::New => None,
            CandidateStatus::Duplicate {
                matched_tenant_entry_id,
            } => Some(matched_tenant_entry_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub new_count: usize,
    pub duplicate_count: usize,
}

impl AnalysisSummary {
    pub fn total(&self) -> usize {
        self.new_count + self.duplicate_count
    }
}

/// Classified candidates, in pack order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub candidates: Vec<CandidateEntry>,
    pub summary: AnalysisSummary,
}

/// Normalize a lookup key: trimmed and lowercased
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lookup indexes over the existing corpus
struct CorpusIndex<'a> {
    by_trigger_or_alias: HashMap<String, &'a TenantEntry>,
    by_title: HashMap<String, &'a TenantEntry>,
}

impl<'a> CorpusIndex<'a> {
    fn build(corpus: &'a [TenantEntry]) -> Self {
        let mut by_trigger_or_alias = HashMap::new();
        let mut by_title = HashMap::new();

        // Later entries overwrite earlier ones on key collision
        for entry in corpus {
            let keys = entry
                .content
                .trigger
                .iter()
                .chain(entry.content.aliases.iter());
            for key in keys {
                insert_key(&mut by_trigger_or_alias, key, entry);
            }
            insert_key(&mut by_title, &entry.content.title, entry);
        }

        Self {
            by_trigger_or_alias,
            by_title,
        }
    }

    /// Trigger match first, then title
    fn find(&self, candidate: &PackEntry) -> Option<&'a TenantEntry> {
        let by_trigger = candidate
            .trigger
            .as_deref()
            .map(normalize)
            .filter(|k| !k.is_empty())
            .and_then(|k| self.by_trigger_or_alias.get(&k).copied());

        by_trigger.or_else(|| {
            let title = normalize(&candidate.title);
            if title.is_empty() {
                None
            } else {
                self.by_title.get(&title).copied()
            }
        })
    }
}

fn insert_key<'a>(map: &mut HashMap<String, &'a TenantEntry>, key: &str, entry: &'a TenantEntry) {
    let key = normalize(key);
    if !key.is_empty() {
        map.insert(key, entry);
    }
}

/// Classify each candidate as New or Duplicate of an existing entry
///
/// New candidates start selected, duplicates start deselected.
pub fn analyze(existing_corpus: &[TenantEntry], candidates: Vec<PackEntry>) -> Analysis {
    let index = CorpusIndex::build(existing_corpus);
    let mut summary = AnalysisSummary::default();

    let candidates = candidates
        .into_iter()
        .map(|entry| match index.find(&entry) {
            Some(existing) => {
                tracing::debug!(
                    "'{}' duplicates existing entry {} ('{}')",
                    entry.title,
                    existing.id,
                    existing.title()
                );
                summary.duplicate_count += 1;
                CandidateEntry {
                    entry,
                    status: CandidateStatus::Duplicate {
                        matched_tenant_entry_id: existing.id.clone(),
                    },
                    selected: false,
                }
            }
            None => {
                summary.new_count += 1;
                CandidateEntry {
                    entry,
                    status: CandidateStatus::New,
                    selected: true,
                }
            }
        })
        .collect();

    Analysis {
        candidates,
        summary,
    }
}
