//! Content library configuration
//!
//! Loaded from `config.yaml` in the platform config directory
//! (e.g. `~/.config/overlay-library/config.yaml`). A missing file yields
//! the built-in defaults.
//!
//! ```yaml
//! catalog_url: https://library.overlay.example/index.json
//! store_url: https://api.overlay.example/v1
//! tenant_id: acme
//! api_token_env: OVERLAY_API_TOKEN
//! timeout_seconds: 30
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default remote catalog index
pub const DEFAULT_CATALOG_URL: &str = "https://library.overlay.example/index.json";

/// Default backing store API root
pub const DEFAULT_STORE_URL: &str = "https://api.overlay.example/v1";

/// Default environment variable holding the store bearer token
pub const DEFAULT_TOKEN_ENV: &str = "OVERLAY_API_TOKEN";

const CONFIG_FILE: &str = "config.yaml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// URL of the catalog index (`{libraries: [...]}`)
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Root URL of the tenant backing store API
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Tenant whose corpus and ledger are operated on
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Name of the environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub api_token_env: String,

    /// Per-request timeout for catalog and store calls
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Directory holding per-tenant ownership ledgers (defaults to the data dir)
    #[serde(default)]
    pub ledger_dir: Option<PathBuf>,
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            store_url: default_store_url(),
            tenant_id: None,
            api_token_env: default_token_env(),
            timeout_seconds: default_timeout(),
            ledger_dir: None,
        }
    }
}

impl LibraryConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_config_path()?)
    }

    /// Load configuration from a specific path, falling back to defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Path of the default config file
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    fn config_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("io", "overlay", "overlay-library")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("overlay-library")))
            .context("Could not determine config directory")
    }

    /// Directory holding ownership ledgers
    pub fn resolved_ledger_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.ledger_dir {
            return Ok(dir.clone());
        }

        directories::ProjectDirs::from("io", "overlay", "overlay-library")
            .map(|dirs| dirs.data_dir().join("ledgers"))
            .or_else(|| dirs::data_dir().map(|d| d.join("overlay-library").join("ledgers")))
            .context("Could not determine data directory")
    }

    /// Tenant id, required by every tenant-scoped operation
    pub fn require_tenant(&self) -> Result<&str> {
        self.tenant_id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .context("No tenant configured. Set tenant_id in config.yaml or pass --tenant")
    }

    /// Bearer token read from the configured environment variable
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}
