//! Overlay Library core - content pack install, merge and distribution engine

pub mod config;
pub mod error;
pub mod library;

pub use error::{LibraryError, Result};
