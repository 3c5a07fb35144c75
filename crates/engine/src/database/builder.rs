//! Database builder for fluent configuration
//!
//! Every collaborator of the record store can be injected; anything left
//! unset is derived from the configuration.
//!
//! ```ignore
//! use thingdb_engine::Database;
//!
//! // 1. Open a data directory, reading thingdb.toml
//! let db = Database::open("/data/things")?;
//!
//! // 2. Builder with explicit collaborators
//! let db = Database::builder()
//!     .path("/data/things")
//!     .registry(Arc::new(ClassRegistry::from_file(schema)?))
//!     .update_mode(UpdateMode::Merge)
//!     .open()?;
//!
//! // 3. Ephemeral (no files, testing)
//! let db = Database::ephemeral();
//! ```

use super::config::{EngineConfig, UpdateMode};
use super::Database;
use crate::registry::{ClassRegistry, OpenRegistry};
use crate::resolver::{HttpRemoteFetcher, NodeIdentity, RemoteFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use thingdb_core::{RecordStorage, Result, SchemaRegistry};
use thingdb_durability::{DurabilityMode, DurableStore, LOG_FILE_NAME};
use thingdb_storage::ShardedStore;
use tracing::info;

/// Builder for [`Database`]
#[derive(Default)]
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    config: EngineConfig,
    registry: Option<Arc<dyn SchemaRegistry>>,
    storage: Option<Arc<dyn RecordStorage>>,
    remote: Option<Arc<dyn RemoteFetcher>>,
}

impl std::fmt::Debug for DatabaseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseBuilder")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("registry", &self.registry.is_some())
            .field("storage", &self.storage.is_some())
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

impl DatabaseBuilder {
    /// Create new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Data directory; without one the database keeps nothing on disk
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Full-update semantics
    pub fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.config.update_mode = mode;
        self
    }

    /// URL this node answers to
    pub fn node_url(mut self, url: impl Into<String>) -> Self {
        self.config.node_url = url.into();
        self
    }

    /// Additional URLs that mean this node
    pub fn local_alias(mut self, url: impl Into<String>) -> Self {
        self.config.local_aliases.push(url.into());
        self
    }

    /// Log sync policy for disk-backed databases
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.config.durability = mode;
        self
    }

    /// Inject the schema registry
    pub fn registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Inject the storage backend
    pub fn storage(mut self, storage: Arc<dyn RecordStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Inject the remote fetcher
    pub fn remote(mut self, remote: Arc<dyn RemoteFetcher>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Build the database
    ///
    /// Defaults for unset collaborators:
    /// - registry: `ClassRegistry` from `config.schema`, else `OpenRegistry`
    /// - storage: `DurableStore` in the data directory, else `ShardedStore`
    /// - remote: `HttpRemoteFetcher` bounded by `remote_timeout_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the schema
    /// document cannot be loaded, or the record log cannot be opened.
    pub fn open(self) -> Result<Arc<Database>> {
        let config = self.config;
        config.validate()?;

        if let Some(dir) = &self.path {
            std::fs::create_dir_all(dir)?;
        }

        let registry: Arc<dyn SchemaRegistry> = match self.registry {
            Some(registry) => registry,
            None => {
                let base = self.path.clone().unwrap_or_default();
                match config.schema_path(&base) {
                    Some(schema) => Arc::new(ClassRegistry::from_file(&schema)?),
                    None => Arc::new(OpenRegistry),
                }
            }
        };

        let mut durable = None;
        let storage: Arc<dyn RecordStorage> = match (self.storage, &self.path) {
            (Some(storage), _) => storage,
            (None, Some(dir)) => {
                let store = Arc::new(DurableStore::open_with_config(
                    dir.join(LOG_FILE_NAME),
                    config.log_config(),
                )?);
                durable = Some(Arc::clone(&store));
                store
            }
            (None, None) => Arc::new(ShardedStore::new()),
        };

        let remote: Arc<dyn RemoteFetcher> = match self.remote {
            Some(remote) => remote,
            None => Arc::new(HttpRemoteFetcher::new(config.remote_timeout())),
        };

        let identity = NodeIdentity::new(config.node_url.clone(), config.local_aliases.iter().cloned());
        info!(
            target: "thingdb::engine",
            data_dir = ?self.path,
            node_url = %identity.node_url(),
            records = storage.len(),
            update_mode = ?config.update_mode,
            "Opened database"
        );

        Ok(Arc::new(Database::assemble(
            self.path, config, identity, registry, storage, durable, remote,
        )))
    }
}
