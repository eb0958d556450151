//! Clients wired up from the loaded configuration

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use library_core::config::LibraryConfig;
use library_core::library::{
    ContentStore, FileLedger, HttpCatalog, HttpStore, Installer, LibraryStore, PackDescriptor,
    PackIndex, Publisher,
};
use library_core::LibraryError;

pub struct Runtime {
    pub config: LibraryConfig,
}

impl Runtime {
    pub fn load(config_path: &Path, tenant: Option<String>) -> Result<Self> {
        let mut config = LibraryConfig::load_from_path(config_path)?;
        if tenant.is_some() {
            config.tenant_id = tenant;
        }
        Ok(Self { config })
    }

    pub fn tenant(&self) -> Result<&str> {
        self.config.require_tenant()
    }

    pub fn catalog(&self) -> Result<HttpCatalog> {
        HttpCatalog::from_config(&self.config).context("Failed to create catalog client")
    }

    pub async fn fetch_index(&self) -> Result<PackIndex> {
        use library_core::library::CatalogSource;

        let catalog = self.catalog()?;
        catalog
            .fetch_index()
            .await
            .with_context(|| format!("Failed to fetch catalog index from {}", catalog.index_url()))
    }

    pub async fn find_pack(&self, pack_id: &str) -> Result<PackDescriptor> {
        let index = self.fetch_index().await?;
        index.get(pack_id).cloned().ok_or_else(|| {
            LibraryError::PackNotFound {
                pack_id: pack_id.to_string(),
            }
            .into()
        })
    }

    fn http_store(&self) -> Result<Arc<HttpStore>> {
        Ok(Arc::new(
            HttpStore::from_config(&self.config).context("Failed to create store client")?,
        ))
    }

    pub fn content_store(&self) -> Result<Arc<dyn ContentStore>> {
        Ok(self.http_store()?)
    }

    pub fn library_store(&self) -> Result<Arc<dyn LibraryStore>> {
        Ok(self.http_store()?)
    }

    pub fn ledger(&self) -> Result<FileLedger> {
        let dir = self.config.resolved_ledger_dir()?;
        Ok(FileLedger::for_tenant(&dir, self.tenant()?))
    }

    pub fn installer(&self) -> Result<Installer> {
        Ok(Installer::new(self.content_store()?, Arc::new(self.ledger()?)))
    }

    pub fn publisher(&self) -> Result<Publisher> {
        Ok(Publisher::new(self.library_store()?))
    }
}
