//! Content Library - pack discovery, install, and distribution
//!
//! This module fetches pre-built content packs from a remote catalog,
//! merges them into a tenant's glossary without creating duplicate terms,
//! and tracks what each pack contributed so it can later be updated or
//! removed.
//!
//! # Overview
//!
//! ```text
//! Catalog (index.json)
//!     │
//!     ├── libraries[]          ← PackDescriptor per pack
//!     └── bundles/*.json       ← PackEntry lists, fetched lazily
//!            │
//!            ▼
//!     analyzer   ← classify New / Duplicate against the tenant corpus
//!            │
//!            ▼
//!     selection  ← operator accepts or rejects each candidate
//!            │
//!            ▼
//!     installer  ← best-effort writes to the backing store
//!            │
//!            ▼
//!     ledger     ← packId -> owned entry ids, version, installedAt
//! ```
//!
//! The authoring side (`authoring`) runs the other way: it bundles a
//! tenant's existing content into a distributable library and asks the
//! backing store to install it into another tenant.

mod analyzer;
mod authoring;
mod catalog;
#[cfg(feature = "http")]
mod http_store;
mod index;
mod installer;
mod ledger;
mod selection;
mod session;
mod status;
mod store;
mod types;

pub use analyzer::{analyze, normalize, Analysis, AnalysisSummary, CandidateEntry, CandidateStatus};
pub use authoring::{build_bundle, AuthoringSelection, Publisher, TenantCorpus};
pub use catalog::{CatalogSource, MemoryCatalog};
#[cfg(feature = "http")]
pub use catalog::HttpCatalog;
#[cfg(feature = "http")]
pub use http_store::HttpStore;
pub use index::{CatalogManifest, PackDescriptor, PackIndex};
pub use installer::{InstallResult, Installer, UninstallResult};
pub use ledger::{FileLedger, LedgerStore, MemoryLedger, OwnershipLedger, OwnershipLedgerRecord};
pub use selection::SelectionState;
pub use session::InstallSession;
pub use status::{outdated, LibraryStatus, OutdatedPack};
pub use store::{ContentStore, LibraryStore, MemoryStore, StoreCall};
pub use types::{
    ContentRecord, InstallCounts, Library, LibraryContentBundle, LibraryDraft, PackEntry,
    RecordKind, TenantEntry,
};
