//! Library authoring and cross-tenant distribution
//!
//! Runs opposite to pack install: the author picks records from their own
//! tenant, the picked records are copied whole into a library, and the
//! backing store installs that library into another tenant. This path does
//! not go through duplicate analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{
    ContentRecord, ContentStore, InstallCounts, Library, LibraryContentBundle, LibraryDraft,
    LibraryStore, RecordKind, TenantEntry,
};
use crate::error::{LibraryError, Result};

/// Record ids the author has picked, per collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoringSelection {
    #[serde(default)]
    pub wiki_entries: BTreeSet<String>,
    #[serde(default)]
    pub plays: BTreeSet<String>,
    #[serde(default)]
    pub banners: BTreeSet<String>,
}

impl AuthoringSelection {
    pub fn is_empty(&self) -> bool {
        self.wiki_entries.is_empty() && self.plays.is_empty() && self.banners.is_empty()
    }
}

/// Everything an author can pick from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantCorpus {
    pub wiki_entries: Vec<TenantEntry>,
    pub plays: Vec<ContentRecord>,
    pub banners: Vec<ContentRecord>,
}

impl TenantCorpus {
    /// Load all three collections of the store's tenant
    pub async fn load(store: &dyn ContentStore) -> Result<Self> {
        Ok(Self {
            wiki_entries: store.list_all().await?,
            plays: store.list_records(RecordKind::Play).await?,
            banners: store.list_records(RecordKind::Banner).await?,
        })
    }
}

/// Copy the selected records out of the corpus, in corpus order
///
/// Ids that are not in the corpus are ignored.
pub fn build_bundle(selection: &AuthoringSelection, corpus: &TenantCorpus) -> LibraryContentBundle {
    let bundle = LibraryContentBundle {
        wiki_entries: corpus
            .wiki_entries
            .iter()
            .filter(|e| selection.wiki_entries.contains(&e.id))
            .cloned()
            .collect(),
        plays: pick(&corpus.plays, &selection.plays),
        banners: pick(&corpus.banners, &selection.banners),
    };

    let counts = bundle.counts();
    let requested = selection.wiki_entries.len() + selection.plays.len() + selection.banners.len();
    if counts.total() < requested {
        tracing::debug!(
            "{} selected ids were not found in the corpus",
            requested - counts.total()
        );
    }
    bundle
}

fn pick(records: &[ContentRecord], ids: &BTreeSet<String>) -> Vec<ContentRecord> {
    records
        .iter()
        .filter(|r| ids.contains(&r.id))
        .cloned()
        .collect()
}

/// Saves libraries and hands them to the backing store for distribution
pub struct Publisher {
    store: Arc<dyn LibraryStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Create a library, or update it when `existing_library_id` is given
    ///
    /// The name must be non-blank; nothing else is validated, so an empty
    /// bundle is accepted.
    pub async fn save_library(
        &self,
        name: &str,
        description: &str,
        bundle: LibraryContentBundle,
        existing_library_id: Option<&str>,
    ) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidLibrary(
                "library name must not be empty".to_string(),
            ));
        }

        let draft = LibraryDraft {
            name: name.to_string(),
            description: description.to_string(),
            content: bundle,
        };

        let library = match existing_library_id {
            Some(id) => self.store.update_library(id, &draft).await?,
            None => self.store.create_library(&draft).await?,
        };

        let counts = draft.content.counts();
        tracing::info!(
            "Saved library '{}' ({}): {} wiki entries, {} plays, {} banners",
            library.name,
            library.id,
            counts.wiki_entries,
            counts.plays,
            counts.banners
        );
        Ok(library.id)
    }

    /// Ask the backing store to install a library into another tenant
    pub async fn install_to_org(
        &self,
        library_id: &str,
        target_tenant_id: &str,
    ) -> Result<InstallCounts> {
        let counts = self
            .store
            .install_library(library_id, target_tenant_id)
            .await?;
        tracing::info!(
            "Library {} installed into {}: {} records",
            library_id,
            target_tenant_id,
            counts.total()
        );
        Ok(counts)
    }

    pub async fn list_my_libraries(&self) -> Result<Vec<Library>> {
        self.store.list_my_libraries().await
    }

    pub async fn get_library(&self, id: &str) -> Result<Option<Library>> {
        self.store.get_library_by_id(id).await
    }

    pub async fn delete_library(&self, id: &str) -> Result<()> {
        self.store.delete_library(id).await?;
        tracing::info!("Deleted library {}", id);
        Ok(())
    }
}
