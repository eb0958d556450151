//! One operator's pass over one pack

use std::sync::Arc;

use super::{
    analyze, AnalysisSummary, CatalogSource, ContentStore, InstallResult, Installer,
    PackDescriptor, PackEntry, SelectionState,
};
use crate::error::Result;

/// Fetched entries, analysis, and selection for a single pack
///
/// The catalog client never caches, so the session holds the fetched
/// entries and re-analysis reuses them. Re-analysis resets selection.
pub struct InstallSession {
    descriptor: PackDescriptor,
    entries: Vec<PackEntry>,
    summary: AnalysisSummary,
    selection: SelectionState,
}

impl InstallSession {
    /// Fetch a pack's entries and analyze them against the tenant corpus
    pub async fn open(
        catalog: &dyn CatalogSource,
        store: &Arc<dyn ContentStore>,
        descriptor: PackDescriptor,
    ) -> Result<Self> {
        let entries = catalog.fetch_entries(&descriptor).await?;
        tracing::debug!(
            "Fetched {} entries for pack '{}'",
            entries.len(),
            descriptor.id
        );

        let mut session = Self {
            descriptor,
            entries,
            summary: AnalysisSummary::default(),
            selection: SelectionState::default(),
        };
        session.reanalyze(store).await?;
        Ok(session)
    }

    /// Re-run analysis against the store's current corpus
    pub async fn reanalyze(&mut self, store: &Arc<dyn ContentStore>) -> Result<AnalysisSummary> {
        let corpus = store.list_all().await?;
        let analysis = analyze(&corpus, self.entries.clone());

        tracing::info!(
            "Pack '{}': {} new, {} duplicate against {} existing entries",
            self.descriptor.id,
            analysis.summary.new_count,
            analysis.summary.duplicate_count,
            corpus.len()
        );

        self.summary = analysis.summary;
        self.selection = SelectionState::from(analysis);
        Ok(self.summary)
    }

    pub fn descriptor(&self) -> &PackDescriptor {
        &self.descriptor
    }

    pub fn entries(&self) -> &[PackEntry] {
        &self.entries
    }

    pub fn summary(&self) -> AnalysisSummary {
        self.summary
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    /// Install the current selection
    pub async fn install(&self, installer: &Installer) -> Result<InstallResult> {
        installer
            .install(&self.descriptor, self.selection.candidates())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{MemoryCatalog, MemoryLedger, MemoryStore};

    fn descriptor() -> PackDescriptor {
        PackDescriptor {
            id: "saas".to_string(),
            name: "SaaS Metrics".to_string(),
            description: String::new(),
            version: "1".to_string(),
            entry_count: Some(2),
            category: None,
            icon: None,
            bundle_ref: "bundles/saas.json".to_string(),
        }
    }

    fn entry(title: &str, trigger: &str) -> PackEntry {
        PackEntry {
            title: title.to_string(),
            trigger: Some(trigger.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_fetches_once_and_reanalysis_resets_selection() {
        let catalog = MemoryCatalog::new()
            .with_pack(descriptor(), vec![entry("ARR", "arr"), entry("Churn", "churn")]);
        let memory = MemoryStore::new("acme");
        let store: Arc<dyn ContentStore> = Arc::new(memory.clone());

        let mut session = InstallSession::open(&catalog, &store, descriptor())
            .await
            .unwrap();
        assert_eq!(session.summary().new_count, 2);
        assert_eq!(catalog.fetch_count(), 1);

        session.selection_mut().set_all(false);
        memory.seed(entry("Churn Rate", "churn"));

        let summary = session.reanalyze(&store).await.unwrap();
        assert_eq!(summary.duplicate_count, 1);
        assert_eq!(session.selection().selected_count(), 1);
        assert_eq!(catalog.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_session_install_uses_selection() {
        let catalog = MemoryCatalog::new()
            .with_pack(descriptor(), vec![entry("ARR", "arr"), entry("Churn", "churn")]);
        let memory = MemoryStore::new("acme");
        let store: Arc<dyn ContentStore> = Arc::new(memory.clone());
        let installer = Installer::new(Arc::clone(&store), Arc::new(MemoryLedger::new()));

        let mut session = InstallSession::open(&catalog, &store, descriptor())
            .await
            .unwrap();
        session.selection_mut().toggle(1);

        let result = session.install(&installer).await.unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(memory.entries()[0].title(), "ARR");
    }
}
