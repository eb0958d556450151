//! Content records shared by the catalog, the backing store, and libraries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A glossary record as shipped in a pack bundle
///
/// Carries no identity; the backing store assigns one on install.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackEntry {
    /// Display title of the term
    pub title: String,

    /// Text that triggers the term in the host CRM
    #[serde(default)]
    pub trigger: Option<String>,

    /// Alternate triggers, in order
    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Rendered body shown for the term
    #[serde(default)]
    pub definition: String,

    #[serde(default)]
    pub link: Option<String>,
}

/// A glossary record owned by the tenant's backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantEntry {
    pub id: String,

    #[serde(flatten)]
    pub content: PackEntry,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TenantEntry {
    pub fn title(&self) -> &str {
        &self.content.title
    }
}

/// Collections the engine copies without interpreting their schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Play,
    Banner,
}

impl RecordKind {
    /// Collection name used by the backing store API
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Play => "plays",
            RecordKind::Banner => "banners",
        }
    }
}

/// A play (battlecard) or banner record
///
/// Only `id` and `title` are read; every other field is carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ContentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            fields: serde_json::Map::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Full copies of tenant records selected for a distributable library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryContentBundle {
    #[serde(default)]
    pub wiki_entries: Vec<TenantEntry>,

    #[serde(default)]
    pub plays: Vec<ContentRecord>,

    #[serde(default)]
    pub banners: Vec<ContentRecord>,
}

impl LibraryContentBundle {
    pub fn is_empty(&self) -> bool {
        self.wiki_entries.is_empty() && self.plays.is_empty() && self.banners.is_empty()
    }

    pub fn counts(&self) -> InstallCounts {
        InstallCounts {
            wiki_entries: self.wiki_entries.len(),
            plays: self.plays.len(),
            banners: self.banners.len(),
        }
    }
}

/// Payload for creating or updating a library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDraft {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub content: LibraryContentBundle,
}

/// A persisted, distributable library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub content: LibraryContentBundle,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Records written by a cross-tenant library install, per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallCounts {
    #[serde(default)]
    pub wiki_entries: usize,

    #[serde(default)]
    pub plays: usize,

    #[serde(default)]
    pub banners: usize,
}

impl InstallCounts {
    pub fn total(&self) -> usize {
        self.wiki_entries + self.plays + self.banners
    }
}
