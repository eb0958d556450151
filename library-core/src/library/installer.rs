//! Pack install and uninstall against the backing store
//!
//! Both directions are best-effort bulk operations. Entries are processed
//! one at a time, in order; a failed create or delete is logged, counted,
//! and skipped. Nothing is rolled back. The ledger is only touched after
//! every entry operation has settled.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{
    CandidateEntry, ContentStore, LedgerStore, OwnershipLedger, OwnershipLedgerRecord,
    PackDescriptor,
};
use crate::error::{LibraryError, Result};

/// Outcome of installing a pack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallResult {
    /// Entries created
    pub success_count: usize,
    /// Entries whose create failed
    pub error_count: usize,
    /// Superseded duplicates deleted before their replacement was created
    pub deleted_duplicates: usize,
    /// Superseded duplicates whose delete failed
    pub failed_deletes: usize,
    /// Ids created by this run; recorded in the ledger unless `ledger_error` is set
    pub owned_entry_ids: Vec<String>,
    /// Ledger write failure after entries were created; `owned_entry_ids` are untracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
}

impl InstallResult {
    /// Some entries landed and some did not
    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && self.error_count > 0
    }

    /// Created entries exist in the store but no ledger record tracks them
    pub fn is_untracked(&self) -> bool {
        self.ledger_error.is_some()
    }

    pub fn summary(&self) -> String {
        format!(
            "installed {}, failed {}",
            self.success_count, self.error_count
        )
    }
}

/// Outcome of uninstalling a pack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UninstallResult {
    pub success_count: usize,
    pub error_count: usize,
}

impl UninstallResult {
    pub fn summary(&self) -> String {
        format!(
            "removed {}, failed {}",
            self.success_count, self.error_count
        )
    }
}

/// Install and uninstall engine for one tenant
pub struct Installer {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn LedgerStore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks a pack as busy until dropped
struct PackGuard {
    pack_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl PackGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, pack_id: &str) -> Result<Self> {
        let mut busy = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !busy.insert(pack_id.to_string()) {
            return Err(LibraryError::PackBusy {
                pack_id: pack_id.to_string(),
            });
        }

        Ok(Self {
            pack_id: pack_id.to_string(),
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for PackGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.pack_id);
    }
}

impl Installer {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            ledger,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Install the selected candidates of a pack
    ///
    /// For each selected candidate, in order: a duplicate's matched entry
    /// is deleted first, then a fresh entry is created. If at least one
    /// create succeeded, the pack's ledger record is overwritten with the
    /// ids created by this run. A run where every create failed leaves the
    /// ledger untouched. A failed ledger write does not discard the counts;
    /// it is reported through [`InstallResult::ledger_error`].
    pub async fn install(
        &self,
        pack: &PackDescriptor,
        candidates: &[CandidateEntry],
    ) -> Result<InstallResult> {
        let _guard = PackGuard::acquire(&self.in_flight, &pack.id)?;

        let selected: Vec<&CandidateEntry> = candidates.iter().filter(|c| c.selected).collect();
        tracing::info!(
            "Installing pack '{}' v{}: {} of {} entries selected",
            pack.id,
            pack.version,
            selected.len(),
            candidates.len()
        );

        let mut result = InstallResult::default();

        for candidate in selected {
            if let Some(matched_id) = candidate.matched_tenant_entry_id() {
                match self.store.delete(matched_id).await {
                    Ok(()) => {
                        tracing::debug!(
                            "Deleted {} superseded by '{}'",
                            matched_id,
                            candidate.entry.title
                        );
                        result.deleted_duplicates += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to delete duplicate {} for '{}': {}",
                            matched_id,
                            candidate.entry.title,
                            e
                        );
                        result.failed_deletes += 1;
                    }
                }
            }

            match self.store.create(&candidate.entry).await {
                Ok(created) => {
                    tracing::debug!("Created '{}' as {}", candidate.entry.title, created.id);
                    result.success_count += 1;
                    result.owned_entry_ids.push(created.id);
                }
                Err(e) => {
                    tracing::warn!("Failed to create '{}': {}", candidate.entry.title, e);
                    result.error_count += 1;
                }
            }
        }

        if result.success_count > 0 {
            let record =
                OwnershipLedgerRecord::new(pack.version.clone(), result.owned_entry_ids.clone());
            if let Err(e) = self.ledger.put(&pack.id, record).await {
                tracing::error!(
                    "Pack '{}' wrote {} entries but the ledger update failed; untracked ids: {:?}",
                    pack.id,
                    result.success_count,
                    result.owned_entry_ids
                );
                result.ledger_error = Some(match std::error::Error::source(&e) {
                    Some(source) => format!("{e}: {source}"),
                    None => e.to_string(),
                });
            }
        } else {
            tracing::warn!(
                "No entries of pack '{}' were created; ledger left unchanged",
                pack.id
            );
        }

        tracing::info!("Pack '{}': {}", pack.id, result.summary());
        Ok(result)
    }

    /// Remove every entry the ledger attributes to a pack
    ///
    /// The ledger record is deleted afterwards no matter how many deletes
    /// failed; entries whose delete failed are no longer tracked.
    pub async fn uninstall(&self, pack_id: &str) -> Result<UninstallResult> {
        let _guard = PackGuard::acquire(&self.in_flight, pack_id)?;

        let record = self
            .ledger
            .get(pack_id)
            .await?
            .ok_or_else(|| LibraryError::NotInstalled {
                pack_id: pack_id.to_string(),
            })?;

        tracing::info!(
            "Uninstalling pack '{}' v{}: {} owned entries",
            pack_id,
            record.version,
            record.owned_entry_ids.len()
        );

        let mut result = UninstallResult::default();
        for id in &record.owned_entry_ids {
            match self.store.delete(id).await {
                Ok(()) => result.success_count += 1,
                Err(e) => {
                    tracing::warn!("Failed to delete {} of pack '{}': {}", id, pack_id, e);
                    result.error_count += 1;
                }
            }
        }

        self.ledger.remove(pack_id).await?;

        if result.error_count > 0 {
            tracing::warn!(
                "Pack '{}' uninstalled with {} orphaned entries",
                pack_id,
                result.error_count
            );
        }
        tracing::info!("Pack '{}': {}", pack_id, result.summary());
        Ok(result)
    }

    /// The tenant's current ledger
    pub async fn installed(&self) -> Result<OwnershipLedger> {
        self.ledger.load().await
    }
}
