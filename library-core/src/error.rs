//! Content library error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the content library engine
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The catalog index or a pack bundle could not be fetched or parsed
    #[error("Content library catalog is unavailable ({url}): {reason}")]
    CatalogUnavailable { url: String, reason: String },

    /// A single create or delete against the backing store failed
    #[error("Failed to write entry '{entry}': {reason}")]
    EntryWriteFailed { entry: String, reason: String },

    /// Uninstall requested for a pack with no ownership ledger record
    #[error("Pack '{pack_id}' is not installed")]
    NotInstalled { pack_id: String },

    /// The requested pack is not listed in the catalog index
    #[error("Pack '{pack_id}' not found in catalog")]
    PackNotFound { pack_id: String },

    /// A library payload failed validation before being saved
    #[error("Invalid library: {0}")]
    InvalidLibrary(String),

    /// Another install or uninstall of the same pack is still running
    #[error("Pack '{pack_id}' already has an install or uninstall in progress")]
    PackBusy { pack_id: String },

    /// The backing store rejected a read or library operation
    #[error("Backing store error: {0}")]
    Store(String),

    /// Failed to read or write the ownership ledger file
    #[error("Failed to access ownership ledger at {path}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ownership ledger file exists but could not be parsed
    #[error("Failed to parse ownership ledger at {path} (corrupted or invalid format)")]
    LedgerParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LibraryError {
    pub(crate) fn catalog(url: impl Into<String>, reason: impl ToString) -> Self {
        LibraryError::CatalogUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_failed(entry: impl Into<String>, reason: impl ToString) -> Self {
        LibraryError::EntryWriteFailed {
            entry: entry.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
