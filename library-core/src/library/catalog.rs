//! Catalog client
//!
//! Fetches the pack index and, on demand, a pack's entry bundle. Nothing is
//! cached here: every call goes back to the source, and callers that want a
//! session cache hold the results themselves (see `InstallSession`).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::index::PackIndex;
use super::{PackDescriptor, PackEntry};
use crate::error::{LibraryError, Result};

/// A source of pack indexes and bundles
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the catalog index
    ///
    /// Fails with `CatalogUnavailable` on a non-success response or a
    /// malformed payload. No retry.
    async fn fetch_index(&self) -> Result<PackIndex>;

    /// Fetch the entries of one pack
    async fn fetch_entries(&self, descriptor: &PackDescriptor) -> Result<Vec<PackEntry>>;
}

/// Catalog served over HTTP as JSON documents
#[cfg(feature = "http")]
pub struct HttpCatalog {
    client: reqwest::Client,
    index_url: String,
}

#[cfg(feature = "http")]
impl HttpCatalog {
    /// Create a catalog client for the given index URL
    pub fn new(index_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let index_url = index_url.into();
        let client = reqwest::Client::builder()
            .user_agent(concat!("overlay-library/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| LibraryError::catalog(&index_url, e))?;

        Ok(Self { client, index_url })
    }

    /// Create a catalog client from engine configuration
    pub fn from_config(config: &crate::config::LibraryConfig) -> Result<Self> {
        Self::new(&config.catalog_url, config.timeout())
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Resolve a bundle locator against the index URL
    pub fn resolve_bundle_url(&self, bundle_ref: &str) -> Result<String> {
        let base = reqwest::Url::parse(&self.index_url)
            .map_err(|e| LibraryError::catalog(&self.index_url, e))?;

        base.join(bundle_ref)
            .map(String::from)
            .map_err(|e| LibraryError::catalog(bundle_ref, e))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LibraryError::catalog(url, e))?;

        if !response.status().is_success() {
            return Err(LibraryError::catalog(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LibraryError::catalog(url, e))?;

        serde_json::from_str(&body)
            .map_err(|e| LibraryError::catalog(url, format!("malformed payload: {e}")))
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch_index(&self) -> Result<PackIndex> {
        let manifest: super::CatalogManifest = self.get_json(&self.index_url).await?;
        let index = PackIndex::from(manifest);
        tracing::debug!("Fetched catalog index from {}: {} packs", self.index_url, index.len());
        Ok(index)
    }

    async fn fetch_entries(&self, descriptor: &PackDescriptor) -> Result<Vec<PackEntry>> {
        let url = self.resolve_bundle_url(&descriptor.bundle_ref)?;
        let bundle: super::index::BundleDocument = self.get_json(&url).await?;

        if let Some(advertised) = descriptor.entry_count {
            if advertised != bundle.entries.len() {
                tracing::debug!(
                    "Pack '{}' advertises {} entries, bundle has {}",
                    descriptor.id,
                    advertised,
                    bundle.entries.len()
                );
            }
        }

        tracing::debug!("Fetched {} entries for pack '{}'", bundle.entries.len(), descriptor.id);
        Ok(bundle.entries)
    }
}

/// In-process catalog, keyed by bundle locator
///
/// Counts fetches so callers can confirm nothing is cached underneath them.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    index: PackIndex,
    bundles: HashMap<String, Vec<PackEntry>>,
    unavailable: bool,
    fetches: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pack and its entries
    pub fn with_pack(mut self, descriptor: PackDescriptor, entries: Vec<PackEntry>) -> Self {
        self.bundles.insert(descriptor.bundle_ref.clone(), entries);
        let mut packs = self.index.list_all().to_vec();
        packs.push(descriptor);
        self.index = PackIndex::new(packs);
        self
    }

    /// Make every fetch fail with `CatalogUnavailable`
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of index and bundle fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self, what: &str) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(LibraryError::catalog(format!("memory://{what}"), "catalog offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn fetch_index(&self) -> Result<PackIndex> {
        self.check_available("index")?;
        Ok(self.index.clone())
    }

    async fn fetch_entries(&self, descriptor: &PackDescriptor) -> Result<Vec<PackEntry>> {
        self.check_available(&descriptor.bundle_ref)?;
        self.bundles
            .get(&descriptor.bundle_ref)
            .cloned()
            .ok_or_else(|| {
                LibraryError::catalog(
                    format!("memory://{}", descriptor.bundle_ref),
                    "bundle not found",
                )
            })
    }
}

#[cfg(all(test, feature = "http"))]
mod http_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resolve_relative_bundle_ref() {
        let catalog =
            HttpCatalog::new("https://library.example.com/v1/index.json", Duration::from_secs(5))
                .unwrap();

        assert_eq!(
            catalog.resolve_bundle_url("bundles/sales.json").unwrap(),
            "https://library.example.com/v1/bundles/sales.json"
        );
        assert_eq!(
            catalog.resolve_bundle_url("/static/sales.json").unwrap(),
            "https://library.example.com/static/sales.json"
        );
        assert_eq!(
            catalog
                .resolve_bundle_url("https://cdn.example.com/sales.json")
                .unwrap(),
            "https://cdn.example.com/sales.json"
        );
    }

    #[test]
    fn test_invalid_index_url() {
        let catalog = HttpCatalog::new("not a url", Duration::from_secs(5)).unwrap();
        let err = catalog.resolve_bundle_url("bundles/x.json").unwrap_err();
        assert!(matches!(err, LibraryError::CatalogUnavailable { .. }));
    }
}
