//! Backing store interfaces
//!
//! The engine never talks to persistence directly. `ContentStore` is the
//! per-tenant record API the install engines drive; `LibraryStore` is the
//! library CRUD surface plus the store's own cross-tenant install, used by
//! the authoring side only.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ContentRecord, InstallCounts, Library, LibraryDraft, PackEntry, RecordKind, TenantEntry,
};
use crate::error::{LibraryError, Result};

/// Per-tenant glossary record API
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a record; the store assigns its id
    async fn create(&self, entry: &PackEntry) -> Result<TenantEntry>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Every glossary record of the tenant
    async fn list_all(&self) -> Result<Vec<TenantEntry>>;

    /// Every play or banner record of the tenant
    async fn list_records(&self, kind: RecordKind) -> Result<Vec<ContentRecord>>;
}

/// Library CRUD and cross-tenant install
#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn create_library(&self, draft: &LibraryDraft) -> Result<Library>;

    async fn update_library(&self, id: &str, draft: &LibraryDraft) -> Result<Library>;

    async fn delete_library(&self, id: &str) -> Result<()>;

    async fn get_library_by_id(&self, id: &str) -> Result<Option<Library>>;

    /// Libraries authored by the current tenant
    async fn list_my_libraries(&self) -> Result<Vec<Library>>;

    /// Install a library into another tenant using the store's own logic
    async fn install_library(
        &self,
        library_id: &str,
        target_tenant_id: &str,
    ) -> Result<InstallCounts>;
}

/// A store operation, as recorded by `MemoryStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { title: String },
    Delete { id: String },
}

#[derive(Debug, Default)]
struct TenantData {
    wiki: Vec<TenantEntry>,
    plays: Vec<ContentRecord>,
    banners: Vec<ContentRecord>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tenants: HashMap<String, TenantData>,
    // library id -> (owning tenant, library)
    libraries: HashMap<String, (String, Library)>,
    fail_create_titles: HashSet<String>,
    fail_delete_ids: HashSet<String>,
    calls: Vec<StoreCall>,
}

/// In-process backing store
///
/// Handles created with `for_tenant` share one world, so cross-tenant
/// installs are visible from the target tenant's handle. Creates and
/// deletes can be made to fail per title or id.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tenant_id: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// A handle on another tenant of the same store
    pub fn for_tenant(&self, tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            state: Arc::clone(&self.state),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a glossary record with a store-assigned id
    pub fn seed(&self, entry: PackEntry) -> TenantEntry {
        let record = new_tenant_entry(entry);
        self.state()
            .tenants
            .entry(self.tenant_id.clone())
            .or_default()
            .wiki
            .push(record.clone());
        record
    }

    /// Seed a play or banner record
    pub fn seed_record(&self, kind: RecordKind, record: ContentRecord) {
        let mut state = self.state();
        let data = state.tenants.entry(self.tenant_id.clone()).or_default();
        match kind {
            RecordKind::Play => data.plays.push(record),
            RecordKind::Banner => data.banners.push(record),
        }
    }

    /// Make every create of an entry with this title fail
    pub fn fail_create_for(&self, title: impl Into<String>) {
        self.state().fail_create_titles.insert(title.into());
    }

    /// Make every delete of this id fail
    pub fn fail_delete_for(&self, id: impl Into<String>) {
        self.state().fail_delete_ids.insert(id.into());
    }

    /// Creates and deletes issued so far, in order, across all tenants
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Current glossary records of this tenant
    pub fn entries(&self) -> Vec<TenantEntry> {
        self.state()
            .tenants
            .get(&self.tenant_id)
            .map(|t| t.wiki.clone())
            .unwrap_or_default()
    }

    pub fn records(&self, kind: RecordKind) -> Vec<ContentRecord> {
        let state = self.state();
        let Some(data) = state.tenants.get(&self.tenant_id) else {
            return Vec::new();
        };
        match kind {
            RecordKind::Play => data.plays.clone(),
            RecordKind::Banner => data.banners.clone(),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn new_tenant_entry(content: PackEntry) -> TenantEntry {
    let now = Utc::now();
    TenantEntry {
        id: new_id(),
        content,
        created_at: Some(now),
        updated_at: Some(now),
        enabled: true,
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create(&self, entry: &PackEntry) -> Result<TenantEntry> {
        let mut state = self.state();
        state.calls.push(StoreCall::Create {
            title: entry.title.clone(),
        });

        if state.fail_create_titles.contains(&entry.title) {
            return Err(LibraryError::write_failed(&entry.title, "create rejected"));
        }

        let record = new_tenant_entry(entry.clone());
        state
            .tenants
            .entry(self.tenant_id.clone())
            .or_default()
            .wiki
            .push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(StoreCall::Delete { id: id.to_string() });

        if state.fail_delete_ids.contains(id) {
            return Err(LibraryError::write_failed(id, "delete rejected"));
        }

        let data = state.tenants.entry(self.tenant_id.clone()).or_default();
        let before = data.wiki.len();
        data.wiki.retain(|e| e.id != id);
        if data.wiki.len() == before {
            return Err(LibraryError::write_failed(id, "no such entry"));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TenantEntry>> {
        Ok(self.entries())
    }

    async fn list_records(&self, kind: RecordKind) -> Result<Vec<ContentRecord>> {
        Ok(self.records(kind))
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn create_library(&self, draft: &LibraryDraft) -> Result<Library> {
        let now = Utc::now();
        let library = Library {
            id: new_id(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            content: draft.content.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.state().libraries.insert(
            library.id.clone(),
            (self.tenant_id.clone(), library.clone()),
        );
        Ok(library)
    }

    async fn update_library(&self, id: &str, draft: &LibraryDraft) -> Result<Library> {
        let mut state = self.state();
        let (_, library) = state
            .libraries
            .get_mut(id)
            .filter(|(owner, _)| *owner == self.tenant_id)
            .ok_or_else(|| LibraryError::Store(format!("library '{id}' not found")))?;

        library.name = draft.name.clone();
        library.description = draft.description.clone();
        library.content = draft.content.clone();
        library.updated_at = Some(Utc::now());
        Ok(library.clone())
    }

    async fn delete_library(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        let owned = matches!(
            state.libraries.get(id),
            Some((owner, _)) if *owner == self.tenant_id
        );
        if !owned {
            return Err(LibraryError::Store(format!("library '{id}' not found")));
        }

        state.libraries.remove(id);
        Ok(())
    }

    async fn get_library_by_id(&self, id: &str) -> Result<Option<Library>> {
        Ok(self.state().libraries.get(id).map(|(_, l)| l.clone()))
    }

    async fn list_my_libraries(&self) -> Result<Vec<Library>> {
        let mut libraries: Vec<Library> = self
            .state()
            .libraries
            .values()
            .filter(|(owner, _)| *owner == self.tenant_id)
            .map(|(_, l)| l.clone())
            .collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(libraries)
    }

    async fn install_library(
        &self,
        library_id: &str,
        target_tenant_id: &str,
    ) -> Result<InstallCounts> {
        let mut state = self.state();
        let content = state
            .libraries
            .get(library_id)
            .map(|(_, l)| l.content.clone())
            .ok_or_else(|| LibraryError::Store(format!("library '{library_id}' not found")))?;

        // Plain copy with fresh ids; no duplicate handling
        let target = state
            .tenants
            .entry(target_tenant_id.to_string())
            .or_default();
        for entry in &content.wiki_entries {
            target.wiki.push(new_tenant_entry(entry.content.clone()));
        }
        for play in &content.plays {
            target.plays.push(ContentRecord {
                id: new_id(),
                ..play.clone()
            });
        }
        for banner in &content.banners {
            target.banners.push(ContentRecord {
                id: new_id(),
                ..banner.clone()
            });
        }

        Ok(content.counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> PackEntry {
        PackEntry {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let store = MemoryStore::new("acme");
        let created = store.create(&entry("ARR")).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        store.delete(&created.id).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Create {
                    title: "ARR".to_string()
                },
                StoreCall::Delete { id: created.id }
            ]
        );
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new("acme");
        let seeded = store.seed(entry("NPS"));
        store.fail_create_for("ARR");
        store.fail_delete_for(&seeded.id);

        let err = store.create(&entry("ARR")).await.unwrap_err();
        assert!(matches!(err, LibraryError::EntryWriteFailed { .. }));
        assert!(store.delete(&seeded.id).await.is_err());
        assert!(store.delete("missing").await.is_err());
        assert_eq!(store.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let acme = MemoryStore::new("acme");
        let globex = acme.for_tenant("globex");

        acme.seed(entry("ARR"));
        assert!(globex.list_all().await.unwrap().is_empty());
        assert_eq!(acme.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_library_ownership() {
        let acme = MemoryStore::new("acme");
        let globex = acme.for_tenant("globex");

        let draft = LibraryDraft {
            name: "Sales".to_string(),
            description: String::new(),
            content: Default::default(),
        };
        let library = acme.create_library(&draft).await.unwrap();

        assert_eq!(acme.list_my_libraries().await.unwrap().len(), 1);
        assert!(globex.list_my_libraries().await.unwrap().is_empty());
        assert!(globex.delete_library(&library.id).await.is_err());
        assert!(globex.update_library(&library.id, &draft).await.is_err());

        acme.delete_library(&library.id).await.unwrap();
        assert!(acme.get_library_by_id(&library.id).await.unwrap().is_none());
    }
}
