//! Configuration for VertexKV
//!
//! Centralized configuration with sensible defaults. A config file (TOML) is
//! optional; every field falls back to its default when missing. The server
//! binary applies command-line overrides on top.
//!
//! ```toml
//! [server]
//! address = "0.0.0.0"
//! port = 6380
//!
//! [server.tls]
//! enabled = true
//! cert_path = "certs/server.crt"
//! key_path = "certs/server.key"
//! ca_path = "certs/ca.crt"
//!
//! [persistence]
//! path = "data"
//! snapshot_interval_secs = 30
//! enabled = true
//!
//! [store]
//! max_entries = 100000
//! max_key_age_secs = 3600
//! ```
//!
//! Configuration is read once at startup; there is no reload.

use crate::persistence::DEFAULT_SNAPSHOT_INTERVAL;
use crate::storage::{StoreLimits, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_KEY_AGE, MAX_KEY_AGE};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main configuration for a VertexKV instance
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub persistence: PersistenceConfig,
    pub store: StoreConfig,
}

/// Network listener settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,

    /// TCP port to listen on
    pub port: u16,

    /// Mutual TLS settings
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            tls: TlsConfig::default(),
        }
    }
}

/// Mutual TLS material. Client certificates are required and verified
/// against `ca_path` whenever TLS is enabled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,

    /// Server certificate chain (PEM)
    pub cert_path: PathBuf,

    /// Server private key (PEM)
    pub key_path: PathBuf,

    /// CA bundle used to verify client certificates (PEM)
    pub ca_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: PathBuf::from("certs/server.crt"),
            key_path: PathBuf::from("certs/server.key"),
            ca_path: PathBuf::from("certs/ca.crt"),
        }
    }
}

/// Snapshot settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Directory holding the snapshot file
    pub path: PathBuf,

    /// Seconds between periodic snapshots
    pub snapshot_interval_secs: u64,

    /// When false, nothing is loaded at startup or saved afterwards
    pub enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL.as_secs(),
            enabled: true,
        }
    }
}

/// Datastore bounds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of keys
    pub max_entries: usize,

    /// Lifetime recorded for each new key (bookkeeping only)
    pub max_key_age_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_key_age_secs: DEFAULT_MAX_KEY_AGE.as_secs(),
        }
    }
}

impl StoreConfig {
    /// Returns the datastore limits described by this section.
    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_entries: self.max_entries,
            max_key_age: Duration::from_secs(self.max_key_age_secs),
        }
    }
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Checks values that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.snapshot_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "persistence.snapshot_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.store.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "store.max_entries must be greater than zero".to_string(),
            ));
        }
        if self.store.max_key_age_secs > MAX_KEY_AGE.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "store.max_key_age_secs must be at most {}",
                MAX_KEY_AGE.as_secs()
            )));
        }
        Ok(())
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }

    /// Returns the interval between periodic snapshots.
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.persistence.snapshot_interval_secs)
    }
}
