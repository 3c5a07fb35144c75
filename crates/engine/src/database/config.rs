//! Database configuration via `thingdb.toml`
//!
//! On first open, a default `thingdb.toml` is created in the data
//! directory. To change settings, edit the file and reopen.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thingdb_core::{Error, Result};
use thingdb_durability::{DurabilityMode, LogConfig, MAX_ENTRY_LEN};

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "thingdb.toml";

/// How a full update treats properties missing from the new schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// The new schema replaces the stored bag; unmentioned properties are dropped
    #[default]
    Replace,
    /// The new schema is merged into the stored bag; unmentioned properties survive
    Merge,
}

fn default_node_url() -> String {
    "http://localhost".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    5000
}

fn default_max_entry_bytes() -> usize {
    MAX_ENTRY_LEN
}

/// Database configuration loaded from `thingdb.toml`.
///
/// # Example
///
/// ```toml
/// node_url = "http://localhost"
/// local_aliases = ["http://127.0.0.1"]
/// update_mode = "replace"
/// remote_timeout_ms = 5000
/// durability = "standard"
/// max_entry_bytes = 16777216
/// # schema = "schema.json"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// URL this node answers to; references pointing here resolve locally
    #[serde(default = "default_node_url")]
    pub node_url: String,
    /// Other URLs that also mean "this node"
    #[serde(default)]
    pub local_aliases: Vec<String>,
    /// Full-update semantics
    #[serde(default)]
    pub update_mode: UpdateMode,
    /// Bound on remote reference lookups, in milliseconds
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    /// Record log sync policy: `"standard"` or `"always"`
    #[serde(default)]
    pub durability: DurabilityMode,
    /// Largest record log entry accepted on write or replay
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: usize,
    /// Class schema document; relative paths are taken from the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            local_aliases: Vec::new(),
            update_mode: UpdateMode::default(),
            remote_timeout_ms: default_remote_timeout_ms(),
            durability: DurabilityMode::default(),
            max_entry_bytes: default_max_entry_bytes(),
            schema: None,
        }
    }
}

impl EngineConfig {
    /// Remote lookup bound as a `Duration`
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Record log parameters
    pub fn log_config(&self) -> LogConfig {
        LogConfig::new()
            .with_mode(self.durability)
            .with_max_entry_len(self.max_entry_bytes)
    }

    /// Check values serde cannot check
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty `node_url`, a zero timeout,
    /// or an out-of-range `max_entry_bytes`.
    pub fn validate(&self) -> Result<()> {
        if self.node_url.trim().is_empty() {
            return Err(Error::Config("node_url must not be empty".into()));
        }
        if self.remote_timeout_ms == 0 {
            return Err(Error::Config("remote_timeout_ms must be greater than zero".into()));
        }
        self.log_config().validate()
    }

    /// Schema document path, resolved against `data_dir`
    pub fn schema_path(&self, data_dir: &Path) -> Option<PathBuf> {
        self.schema.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                data_dir.join(p)
            }
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# thingdb configuration
#
# URL this node answers to. Cross-references whose locationUrl equals this
# (or one of local_aliases, or is empty) are resolved from local storage.
node_url = "http://localhost"
local_aliases = []

# Full update semantics: "replace" (default) or "merge"
#   "replace" = the new schema replaces the stored one
#   "merge"   = properties missing from the new schema are kept
update_mode = "replace"

# Timeout for resolving references held by other nodes (milliseconds)
remote_timeout_ms = 5000

# Durability mode: "standard" (default) or "always"
#   "standard" = flush every write, OS decides when to fsync
#   "always"   = fsync every write
durability = "standard"

# Largest record log entry in bytes. On open, a length field above this is
# treated as corruption instead of a torn write.
max_entry_bytes = 16777216

# Class schema document (JSON). Without it every class is accepted.
# schema = "schema.json"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
