//! Configuration loading for board-server.
//!
//! Configuration is loaded from a TOML file (default: `boardsync.toml`).

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for board-server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Cache configuration.
    pub cache: CacheConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
}

/// Cache configuration.
///
/// TTLs are the bounded-staleness fallback: a missed invalidation self-heals
/// within one TTL window.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL in seconds for single-entity and expanded-tree entries (default: 30 minutes).
    #[serde(default = "default_entity_ttl")]
    pub entity_ttl_secs: u64,
    /// TTL in seconds for collection entries such as a user's board list (default: 10 minutes).
    #[serde(default = "default_list_ttl")]
    pub list_ttl_secs: u64,
    /// Sweep interval in seconds for the expired-entry eviction task (default: 60).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Enable the background sweep task (default: true).
    #[serde(default = "default_sweep_enabled")]
    pub sweep_enabled: bool,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("boardsync.db")
}

fn default_entity_ttl() -> u64 {
    30 * 60
}

fn default_list_ttl() -> u64 {
    10 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sweep_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database: default_database_path(),
            },
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entity_ttl_secs: default_entity_ttl(),
            list_ttl_secs: default_list_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_enabled: default_sweep_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
