//! Catalog index parsing and lookup
//!
//! The catalog index lists every pack a catalog offers along with its
//! version stamp and the locator of its entry bundle.

use serde::{Deserialize, Serialize};

/// Wire shape of the catalog index document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub libraries: Vec<PackDescriptor>,
}

/// Wire shape of a pack bundle document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct BundleDocument {
    #[serde(default)]
    pub entries: Vec<super::PackEntry>,
}

/// A pack as described by the catalog index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackDescriptor {
    /// Stable pack identifier, the ownership ledger key
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Opaque version stamp, only ever compared for equality
    pub version: String,

    /// Advisory entry count; the bundle is authoritative
    #[serde(default)]
    pub entry_count: Option<usize>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    /// Locator of the entry bundle, absolute or relative to the index URL
    pub bundle_ref: String,
}

impl PackDescriptor {
    /// Truncate description to first line
    pub fn short_description(&self) -> &str {
        self.description
            .lines()
            .next()
            .unwrap_or(&self.description)
            .trim()
    }

    pub fn category_display(&self) -> &str {
        self.category.as_deref().unwrap_or("-")
    }
}

/// The packs offered by one catalog, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackIndex {
    packs: Vec<PackDescriptor>,
}

impl From<CatalogManifest> for PackIndex {
    fn from(manifest: CatalogManifest) -> Self {
        Self::new(manifest.libraries)
    }
}

impl PackIndex {
    pub fn new(packs: Vec<PackDescriptor>) -> Self {
        Self { packs }
    }

    /// Parse index from a JSON document
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<CatalogManifest>(content).map(Self::from)
    }

    /// Get a pack by id
    pub fn get(&self, id: &str) -> Option<&PackDescriptor> {
        self.packs.iter().find(|p| p.id == id)
    }

    /// Search packs by query string
    ///
    /// Matches against id, name, description, and category (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&PackDescriptor> {
        let query_lower = query.trim().to_lowercase();

        self.packs
            .iter()
            .filter(|pack| {
                query_lower.is_empty()
                    || pack.id.to_lowercase().contains(&query_lower)
                    || pack.name.to_lowercase().contains(&query_lower)
                    || pack.description.to_lowercase().contains(&query_lower)
                    || pack
                        .category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&query_lower))
            })
            .collect()
    }

    /// Filter packs by category (case-insensitive, exact)
    pub fn filter_by_category(&self, category: &str) -> Vec<&PackDescriptor> {
        self.packs
            .iter()
            .filter(|p| {
                p.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect()
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .packs
            .iter()
            .filter_map(|p| p.category.as_deref())
            .collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    pub fn list_all(&self) -> &[PackDescriptor] {
        &self.packs
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}
