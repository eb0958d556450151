//! Per-session include/exclude decisions for analyzed candidates

use super::analyzer::{Analysis, CandidateEntry};
use super::normalize;

/// Which candidates the operator has chosen to install
///
/// Lives only as long as one analysis. Filtering is pure: it narrows the
/// rows a bulk toggle touches and never changes hidden rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    candidates: Vec<CandidateEntry>,
}

impl From<Analysis> for SelectionState {
    fn from(analysis: Analysis) -> Self {
        Self::new(analysis.candidates)
    }
}

impl SelectionState {
    pub fn new(candidates: Vec<CandidateEntry>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[CandidateEntry] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<CandidateEntry> {
        self.candidates
    }

    /// Flip one row; returns the new value, or `None` if out of range
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let candidate = self.candidates.get_mut(index)?;
        candidate.selected = !candidate.selected;
        Some(candidate.selected)
    }

    /// Set one row; returns false if out of range
    pub fn set(&mut self, index: usize, selected: bool) -> bool {
        match self.candidates.get_mut(index) {
            Some(candidate) => {
                candidate.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Select or deselect every row in the pack
    pub fn set_all(&mut self, selected: bool) {
        for candidate in &mut self.candidates {
            candidate.selected = selected;
        }
    }

    /// Indices of rows matching a free-text query
    ///
    /// Matches title, trigger, aliases, and category, case-insensitively.
    /// An empty query matches every row.
    pub fn filter(&self, query: &str) -> Vec<usize> {
        let query = normalize(query);

        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| query.is_empty() || matches_query(c, &query))
            .map(|(i, _)| i)
            .collect()
    }

    /// Set every row matching `query`; returns how many rows were touched
    pub fn set_filtered(&mut self, query: &str, selected: bool) -> usize {
        let indices = self.filter(query);
        for &i in &indices {
            self.candidates[i].selected = selected;
        }
        indices.len()
    }

    /// Set only the duplicate rows, or only the new rows
    pub fn set_where_duplicate(&mut self, duplicate: bool, selected: bool) -> usize {
        let mut touched = 0;
        for candidate in self
            .candidates
            .iter_mut()
            .filter(|c| c.is_duplicate() == duplicate)
        {
            candidate.selected = selected;
            touched += 1;
        }
        touched
    }

    pub fn selected(&self) -> impl Iterator<Item = &CandidateEntry> {
        self.candidates.iter().filter(|c| c.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn matches_query(candidate: &CandidateEntry, query: &str) -> bool {
    let entry = &candidate.entry;
    let contains = |value: &str| value.to_lowercase().contains(query);

    contains(entry.title.as_str())
        || entry.trigger.as_deref().is_some_and(contains)
        || entry.aliases.iter().any(|a| contains(a.as_str()))
        || entry.category.as_deref().is_some_and(contains)
}
