//! Ownership ledger (`ledger-<tenant>.yaml`)
//!
//! Tracks which tenant entries each installed pack created, so the pack
//! can later be updated or removed. A record always describes the most
//! recent install of its pack; re-installing replaces the owned id list
//! rather than extending it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{LibraryError, Result};

/// Ledger file schema version
const LEDGER_API_VERSION: &str = "overlay.library/v1";

/// What one pack installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipLedgerRecord {
    /// Pack version at the time of install
    pub version: String,
    pub installed_at: DateTime<Utc>,
    /// Tenant entry ids created by the most recent install
    pub owned_entry_ids: Vec<String>,
}

impl OwnershipLedgerRecord {
    pub fn new(version: impl Into<String>, owned_entry_ids: Vec<String>) -> Self {
        Self {
            version: version.into(),
            installed_at: Utc::now(),
            owned_entry_ids,
        }
    }
}

/// A tenant's ledger: pack id -> record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipLedger {
    pub api_version: String,
    /// When this ledger was last written
    pub generated: String,
    #[serde(default)]
    pub packs: BTreeMap<String, OwnershipLedgerRecord>,
}

impl Default for OwnershipLedger {
    fn default() -> Self {
        Self {
            api_version: LEDGER_API_VERSION.to_string(),
            generated: Utc::now().to_rfc3339(),
            packs: BTreeMap::new(),
        }
    }
}

impl OwnershipLedger {
    pub fn get(&self, pack_id: &str) -> Option<&OwnershipLedgerRecord> {
        self.packs.get(pack_id)
    }

    pub fn is_installed(&self, pack_id: &str) -> bool {
        self.packs.contains_key(pack_id)
    }

    /// Insert or replace a pack's record
    pub fn put(&mut self, pack_id: &str, record: OwnershipLedgerRecord) {
        self.packs.insert(pack_id.to_string(), record);
    }

    pub fn remove(&mut self, pack_id: &str) -> Option<OwnershipLedgerRecord> {
        self.packs.remove(pack_id)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

/// Persistence for a tenant's ownership ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the whole ledger
    async fn load(&self) -> Result<OwnershipLedger>;

    async fn get(&self, pack_id: &str) -> Result<Option<OwnershipLedgerRecord>> {
        Ok(self.load().await?.packs.remove(pack_id))
    }

    /// Write or overwrite a pack's record
    async fn put(&self, pack_id: &str, record: OwnershipLedgerRecord) -> Result<()>;

    /// Delete a pack's record; deleting a missing record is not an error
    async fn remove(&self, pack_id: &str) -> Result<()>;
}

/// Ledger persisted as a YAML file
pub struct FileLedger {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Ledger file for a tenant inside `dir`
    ///
    /// Bytes outside `[A-Za-z0-9-]` are written as `_XX`, so distinct
    /// tenant ids never share a file.
    pub fn for_tenant(dir: &Path, tenant_id: &str) -> Self {
        let mut safe = String::with_capacity(tenant_id.len());
        for byte in tenant_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(char::from(byte));
            } else {
                safe.push_str(&format!("_{byte:02X}"));
            }
        }
        Self::new(dir.join(format!("ledger-{safe}.yaml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<OwnershipLedger> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(OwnershipLedger::default());
            }
            Err(source) => {
                return Err(LibraryError::Ledger {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_yaml_ng::from_str(&content).map_err(|source| LibraryError::LedgerParse {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, ledger: &OwnershipLedger) -> Result<()> {
        let io_err = |source| LibraryError::Ledger {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut ledger = ledger.clone();
        ledger.generated = Utc::now().to_rfc3339();

        let content = serde_yaml_ng::to_string(&ledger).map_err(|source| {
            LibraryError::LedgerParse {
                path: self.path.clone(),
                source,
            }
        })?;

        tokio::fs::write(&self.path, content).await.map_err(io_err)
    }
}

#[async_trait]
impl LedgerStore for FileLedger {
    async fn load(&self) -> Result<OwnershipLedger> {
        self.read().await
    }

    async fn put(&self, pack_id: &str, record: OwnershipLedgerRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut ledger = self.read().await?;
        ledger.put(pack_id, record);
        self.write(&ledger).await?;
        tracing::debug!("Ledger {}: recorded pack '{}'", self.path.display(), pack_id);
        Ok(())
    }

    async fn remove(&self, pack_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut ledger = self.read().await?;
        if ledger.remove(pack_id).is_some() {
            self.write(&ledger).await?;
            tracing::debug!("Ledger {}: removed pack '{}'", self.path.display(), pack_id);
        }
        Ok(())
    }
}

/// Ledger held in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    ledger: Mutex<OwnershipLedger>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn load(&self) -> Result<OwnershipLedger> {
        Ok(self.ledger.lock().await.clone())
    }

    async fn get(&self, pack_id: &str) -> Result<Option<OwnershipLedgerRecord>> {
        Ok(self.ledger.lock().await.get(pack_id).cloned())
    }

    async fn put(&self, pack_id: &str, record: OwnershipLedgerRecord) -> Result<()> {
        self.ledger.lock().await.put(pack_id, record);
        Ok(())
    }

    async fn remove(&self, pack_id: &str) -> Result<()> {
        self.ledger.lock().await.remove(pack_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_default_ledger() {
        let ledger = OwnershipLedger::default();
        assert_eq!(ledger.api_version, LEDGER_API_VERSION);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_put_replaces_existing() {
        let mut ledger = OwnershipLedger::default();
        ledger.put("sales", OwnershipLedgerRecord::new("1", ids(&["x", "y"])));
        ledger.put("sales", OwnershipLedgerRecord::new("2", ids(&["z"])));

        assert_eq!(ledger.len(), 1);
        let record = ledger.get("sales").unwrap();
        assert_eq!(record.version, "2");
        assert_eq!(record.owned_entry_ids, ids(&["z"]));
    }

    #[tokio::test]
    async fn test_file_ledger_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FileLedger::new(temp_dir.path().join("ledger.yaml"));

        assert!(ledger.load().await.unwrap().is_empty());
        assert!(ledger.get("sales").await.unwrap().is_none());
        // Removing a missing record does not create the file
        ledger.remove("sales").await.unwrap();
        assert!(!ledger.path().exists());
    }

    #[tokio::test]
    async fn test_file_ledger_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ledger.yaml");

        {
            let ledger = FileLedger::new(&path);
            ledger
                .put("sales", OwnershipLedgerRecord::new("2024.11", ids(&["w-1", "w-2"])))
                .await
                .unwrap();
            ledger
                .put("legal", OwnershipLedgerRecord::new("3", ids(&["w-9"])))
                .await
                .unwrap();
        }

        let ledger = FileLedger::new(&path);
        let loaded = ledger.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get("sales").unwrap().owned_entry_ids,
            ids(&["w-1", "w-2"])
        );

        ledger.remove("sales").await.unwrap();
        assert!(!ledger.load().await.unwrap().is_installed("sales"));
        assert!(ledger.get("legal").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_ledger_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.yaml");
        std::fs::write(&path, "packs: [this is not a map").unwrap();

        let err = FileLedger::new(&path).load().await.unwrap_err();
        assert!(matches!(err, LibraryError::LedgerParse { .. }));
    }

    #[test]
    fn test_for_tenant_sanitizes_id() {
        let ledger = FileLedger::for_tenant(Path::new("/tmp/ledgers"), "acme/../corp");
        assert_eq!(
            ledger.path(),
            Path::new("/tmp/ledgers/ledger-acme_2F_2E_2E_2Fcorp.yaml")
        );
    }

    #[test]
    fn test_for_tenant_distinct_ids_get_distinct_files() {
        let dir = Path::new("/tmp/ledgers");
        let dotted = FileLedger::for_tenant(dir, "acme.com");
        let underscored = FileLedger::for_tenant(dir, "acme_com");

        assert_ne!(dotted.path(), underscored.path());
        assert_eq!(dotted.path(), dir.join("ledger-acme_2Ecom.yaml"));
        assert_eq!(
            FileLedger::for_tenant(dir, "globex-eu").path(),
            dir.join("ledger-globex-eu.yaml")
        );
    }

    #[tokio::test]
    async fn test_memory_ledger() {
        let ledger = MemoryLedger::new();
        ledger
            .put("sales", OwnershipLedgerRecord::new("1", ids(&["a"])))
            .await
            .unwrap();
        assert!(ledger.get("sales").await.unwrap().is_some());

        ledger.remove("sales").await.unwrap();
        assert!(ledger.load().await.unwrap().is_empty());
    }
}
