//! Installed-versus-catalog comparison

use serde::Serialize;

use super::{OwnershipLedger, PackDescriptor, PackIndex};

/// Where a catalog pack stands for this tenant
///
/// Versions are opaque; any difference from the installed version counts
/// as an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LibraryStatus {
    NotInstalled,
    UpToDate,
    UpdateAvailable { installed: String },
}

impl LibraryStatus {
    pub fn for_pack(descriptor: &PackDescriptor, ledger: &OwnershipLedger) -> Self {
        match ledger.get(&descriptor.id) {
            None => Self::NotInstalled,
            Some(record) if record.version == descriptor.version => Self::UpToDate,
            Some(record) => Self::UpdateAvailable {
                installed: record.version.clone(),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotInstalled => "not installed",
            Self::UpToDate => "installed",
            Self::UpdateAvailable { .. } => "update available",
        }
    }
}

/// An installed pack that no longer matches the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedPack {
    pub pack_id: String,
    pub installed_version: String,
    /// `None` when the pack has been withdrawn from the catalog
    pub available_version: Option<String>,
}

/// Installed packs whose catalog version differs, plus withdrawn packs
pub fn outdated(index: &PackIndex, ledger: &OwnershipLedger) -> Vec<OutdatedPack> {
    ledger
        .packs
        .iter()
        .filter_map(|(pack_id, record)| match index.get(pack_id) {
            Some(descriptor) if descriptor.version == record.version => None,
            descriptor => Some(OutdatedPack {
                pack_id: pack_id.clone(),
                installed_version: record.version.clone(),
                available_version: descriptor.map(|d| d.version.clone()),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::OwnershipLedgerRecord;

    fn descriptor(id: &str, version: &str) -> PackDescriptor {
        PackDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            version: version.to_string(),
            entry_count: None,
            category: None,
            icon: None,
            bundle_ref: format!("bundles/{id}.json"),
        }
    }

    fn ledger() -> OwnershipLedger {
        let mut ledger = OwnershipLedger::default();
        ledger.put("sales", OwnershipLedgerRecord::new("1", vec![]));
        ledger.put("legal", OwnershipLedgerRecord::new("2024-01", vec![]));
        ledger.put("retired", OwnershipLedgerRecord::new("1", vec![]));
        ledger
    }

    #[test]
    fn test_status_for_pack() {
        let ledger = ledger();
        assert_eq!(
            LibraryStatus::for_pack(&descriptor("hr", "1"), &ledger),
            LibraryStatus::NotInstalled
        );
        assert_eq!(
            LibraryStatus::for_pack(&descriptor("sales", "1"), &ledger),
            LibraryStatus::UpToDate
        );
        assert_eq!(
            LibraryStatus::for_pack(&descriptor("legal", "2024-02"), &ledger),
            LibraryStatus::UpdateAvailable {
                installed: "2024-01".to_string()
            }
        );
    }

    #[test]
    fn test_outdated() {
        let index = PackIndex::new(vec![
            descriptor("sales", "1"),
            descriptor("legal", "2024-02"),
            descriptor("hr", "1"),
        ]);

        let result = outdated(&index, &ledger());
        assert_eq!(
            result,
            vec![
                OutdatedPack {
                    pack_id: "legal".to_string(),
                    installed_version: "2024-01".to_string(),
                    available_version: Some("2024-02".to_string()),
                },
                OutdatedPack {
                    pack_id: "retired".to_string(),
                    installed_version: "1".to_string(),
                    available_version: None,
                },
            ]
        );
    }
}
