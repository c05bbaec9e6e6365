//! # Configuration
//!
//! Settings come from an optional TOML file, then `MENURANK_*` environment
//! variables override individual values.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [ledger]
//! base = 1000
//! [[ledger.aliases]]
//! category = "SKLEP\\Kurtki"
//! linked = ["SKLEP\\Kurtki\\Zobacz wszystkie"]
//! symmetric = true
//!
//! [patch]
//! refresh_generated = true
//! sync_version_priority = false
//!
//! [source]
//! url = "https://shop.example/products_export.xml"
//! timeout_secs = 60
//!
//! [gateway]
//! url = "http://localhost:3001"
//! shop_id = 1
//! tree_id = 1
//! ```
//!
//! Server-side security settings (`MENURANK_API_KEY`, `MENURANK_CORS_ORIGINS`,
//! `MENURANK_RATE_LIMIT`) are read by the API layer directly.

use menurank_core::{
    LedgerConfig, MenuRankError, PatchEngine, PatchOptions, Session,
    primitives::{DEFAULT_SHOP_ID, DEFAULT_TREE_ID},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "menurank.toml";

/// Default network timeout for source fetches and publishes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_shop_id() -> u32 {
    DEFAULT_SHOP_ID
}

fn default_tree_id() -> u32 {
    DEFAULT_TREE_ID
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where `POST /document/fetch` loads the export from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
    /// Sent as `x-api-key` when set.
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Where `POST /publish` sends priority updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_shop_id")]
    pub shop_id: u32,
    #[serde(default = "default_tree_id")]
    pub tree_id: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            shop_id: DEFAULT_SHOP_ID,
            tree_id: DEFAULT_TREE_ID,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub patch: PatchOptions,
    pub source: SourceConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `menurank.toml` in the
    /// working directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, MenuRankError> {
        let file: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            }
        };

        let mut config = match file {
            Some(file) => {
                let text = std::fs::read_to_string(&file).map_err(|e| {
                    MenuRankError::Config(format!("Cannot read {}: {}", file.display(), e))
                })?;
                tracing::debug!("Loaded configuration from {}", file.display());
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document; missing sections take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, MenuRankError> {
        toml::from_str(text).map_err(|e| MenuRankError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply `MENURANK_*` overrides using `lookup` to read variables.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = lookup("MENURANK_PRIORITY_BASE") {
            match base.trim().parse() {
                Ok(base) => self.ledger.base = base,
                Err(_) => tracing::warn!("Ignoring invalid MENURANK_PRIORITY_BASE '{}'", base),
            }
        }
        if let Some(url) = lookup("MENURANK_SOURCE_URL") {
            self.source.url = Some(url);
        }
        if let Some(url) = lookup("MENURANK_GATEWAY_URL") {
            self.gateway.url = Some(url);
        }
        if let Some(key) = lookup("MENURANK_GATEWAY_KEY") {
            self.gateway.api_key = Some(key);
        }
    }

    /// Fresh session wired with the configured ledger and patch options.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.ledger.build(), PatchEngine::new(self.patch))
    }
}

// =============================================================================
// TESTS
// =============================================================================
