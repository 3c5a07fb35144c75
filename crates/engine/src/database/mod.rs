//! Database: the record store
//!
//! Single authority over the lifecycle of Things and Actions:
//! - create / get / list
//! - full update and JSON-patch style partial update
//! - delete
//! - cross-reference resolution
//!
//! ## Mutation Sequence
//!
//! ```text
//! 1. Take the per-id lock
//! 2. Read the current record
//! 3. Build the next record (Update Engine or Patch Engine)
//! 4. Write it with one storage put
//! 5. Release the lock
//! ```
//!
//! Reads take no lock. Storage swaps whole records, so a reader sees the
//! state before or after a mutation, never a mix.

pub mod builder;
pub mod config;

pub use builder::DatabaseBuilder;
pub use config::{EngineConfig, UpdateMode, CONFIG_FILE_NAME};

use crate::patch::PatchEngine;
use crate::registry::OpenRegistry;
use crate::resolver::{NoRemote, NodeIdentity, RemoteFetcher, Resolver};
use crate::update::UpdateEngine;
use crate::validation::validate_bag;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thingdb_concurrency::{LockManager, LockStats};
use thingdb_core::{
    CrossRef, Error, PatchDocument, PropertyBag, Record, RecordId, RecordKind, RecordStorage,
    Result, SchemaRegistry,
};
use thingdb_durability::DurableStore;
use thingdb_storage::ShardedStore;
use tracing::{debug, info};

/// The record store
///
/// Create one with [`Database::open`], [`Database::builder`] or
/// [`Database::ephemeral`]. All methods take `&self` and are safe to call
/// from many threads at once.
///
/// # Example
///
/// ```text
/// use thingdb_engine::Database;
///
/// let db = Database::ephemeral();
/// let action = db.create(RecordKind::Action, "TestAction", "", PropertyBag::new())?;
/// db.full_update(&action.id, "TestAction", "blurgh", PropertyBag::new().with("testNumber", 41.0))?;
/// ```
pub struct Database {
    /// Data directory (None for ephemeral databases)
    data_dir: Option<PathBuf>,
    config: EngineConfig,
    storage: Arc<dyn RecordStorage>,
    /// Same store as `storage` when it is disk-backed
    durable: Option<Arc<DurableStore>>,
    registry: Arc<dyn SchemaRegistry>,
    resolver: Resolver,
    locks: LockManager,
    patcher: PatchEngine,
    updater: UpdateEngine,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("config", &self.config)
            .field("records", &self.storage.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open database at given path
    ///
    /// Reads `thingdb.toml` from the data directory. If no config file
    /// exists, one is created with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the record log cannot
    /// be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        EngineConfig::write_default_if_missing(&config_path)?;
        let config = EngineConfig::from_file(&config_path)?;

        DatabaseBuilder::new().path(data_dir).config(config).open()
    }

    /// Open database at the given path with an explicit configuration
    ///
    /// The configuration is written to `thingdb.toml` so later
    /// [`Database::open`] calls pick up the same settings.
    ///
    /// # Errors
    ///
    /// Same as [`Database::open`].
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        config.validate()?;
        config.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        DatabaseBuilder::new().path(data_dir).config(config).open()
    }

    /// In-memory database with no schema enforcement and no remote peers
    pub fn ephemeral() -> Arc<Self> {
        let config = EngineConfig::default();
        let identity = NodeIdentity::new(config.node_url.clone(), config.local_aliases.iter().cloned());
        Arc::new(Self::assemble(
            None,
            config,
            identity,
            Arc::new(OpenRegistry),
            Arc::new(ShardedStore::new()),
            None,
            Arc::new(NoRemote),
        ))
    }

    /// Start a builder
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn assemble(
        data_dir: Option<PathBuf>,
        config: EngineConfig,
        identity: NodeIdentity,
        registry: Arc<dyn SchemaRegistry>,
        storage: Arc<dyn RecordStorage>,
        durable: Option<Arc<DurableStore>>,
        remote: Arc<dyn RemoteFetcher>,
    ) -> Self {
        let resolver = Resolver::new(identity, Arc::clone(&registry), remote);
        let updater = UpdateEngine::new(config.update_mode);
        Self {
            data_dir,
            config,
            storage,
            durable,
            registry,
            resolver,
            locks: LockManager::new(),
            patcher: PatchEngine,
            updater,
        }
    }

    // ========================================================================
    // Record lifecycle
    // ========================================================================

    /// Create a record with a fresh id
    ///
    /// # Errors
    ///
    /// `Validation` if the class or schema fail registry checks,
    /// `Reference(InvalidType)` if a reference value has an unknown type.
    pub fn create(
        &self,
        kind: RecordKind,
        class: &str,
        context: impl Into<String>,
        schema: PropertyBag,
    ) -> Result<Record> {
        validate_bag(self.registry.as_ref(), kind, class, &schema)?;
        let record = Record::new(kind, class, context, schema);
        self.storage.put(record.clone())?;
        debug!(target: "thingdb::engine", id = %record.id, kind = %kind, class, "Created record");
        Ok(record)
    }

    /// Current state of a record
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown or deleted.
    pub fn get(&self, id: &RecordId) -> Result<Record> {
        self.storage.get(id)?.ok_or(Error::NotFound(*id))
    }

    /// All records of a kind, ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the storage scan fails.
    pub fn list(&self, kind: RecordKind) -> Result<Vec<Record>> {
        self.storage.scan(Some(kind))
    }

    /// Replace class-checked context and schema of a record
    ///
    /// Whether properties missing from `schema` are dropped or kept is
    /// decided by the configured [`UpdateMode`].
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation` (class change or schema mismatch), or
    /// `Reference(InvalidType)`.
    pub fn full_update(
        &self,
        id: &RecordId,
        class: &str,
        context: impl Into<String>,
        schema: PropertyBag,
    ) -> Result<Record> {
        let context = context.into();
        self.locks.with_lock(id, || {
            let current = self.get(id)?;
            let next = self
                .updater
                .apply(self.registry.as_ref(), &current, class, context, schema)?;
            self.storage.put(next.clone())?;
            debug!(target: "thingdb::engine", id = %id, version = next.version, "Updated record");
            Ok(next)
        })
    }

    /// Apply a batch of patch operations
    ///
    /// All-or-nothing: if any operation fails the stored record is left
    /// exactly as it was. An empty batch returns the record unchanged.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Patch(..)`, `Reference(InvalidType)`, or `Validation`.
    pub fn patch(&self, id: &RecordId, operations: &[PatchDocument]) -> Result<Record> {
        self.locks.with_lock(id, || {
            let current = self.get(id)?;
            if operations.is_empty() {
                return Ok(current);
            }
            let bag = self
                .patcher
                .apply(self.registry.as_ref(), &current, operations)?;

            let mut next = current;
            next.schema = bag;
            next.touch();
            self.storage.put(next.clone())?;
            debug!(
                target: "thingdb::engine",
                id = %id,
                version = next.version,
                operations = operations.len(),
                "Patched record"
            );
            Ok(next)
        })
    }

    /// Delete a record
    ///
    /// Not idempotent: deleting an absent id fails.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown or already deleted.
    pub fn delete(&self, id: &RecordId) -> Result<()> {
        self.locks.with_lock(id, || {
            self.storage.delete(id)?.ok_or(Error::NotFound(*id))
        })?;
        // Ids are never reused
        self.locks.remove(id);
        debug!(target: "thingdb::engine", id = %id, "Deleted record");
        Ok(())
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Dereference a cross-reference
    ///
    /// # Errors
    ///
    /// `Reference(InvalidType | TargetNotFound | Timeout | RemoteFailure)`.
    pub fn resolve(&self, cref: &CrossRef) -> Result<Record> {
        self.resolver.resolve(self.storage.as_ref(), cref)
    }

    /// Dereference the reference stored in property `name` of record `id`
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown record, `Validation` if the property is
    /// missing or not a reference, then the errors of [`Database::resolve`].
    pub fn resolve_property(&self, id: &RecordId, name: &str) -> Result<Record> {
        let record = self.get(id)?;
        let cref = record
            .schema
            .get(name)
            .and_then(|value| value.as_reference())
            .ok_or_else(|| {
                Error::validation(format!("property '{}' of {} is not a reference", name, id))
            })?;
        self.resolve(cref)
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Data directory, None for ephemeral databases
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Schema registry in use
    pub fn registry(&self) -> &Arc<dyn SchemaRegistry> {
        &self.registry
    }

    /// Per-id lock counters
    pub fn lock_stats(&self) -> LockStats {
        self.locks.stats()
    }

    /// Force the record log to disk; no-op for in-memory storage
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn flush(&self) -> Result<()> {
        match &self.durable {
            Some(store) => store.sync(),
            None => Ok(()),
        }
    }

    /// Rewrite the record log down to one entry per live record
    ///
    /// Returns the number of entries written, 0 for in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the new log cannot be written.
    pub fn compact(&self) -> Result<usize> {
        match &self.durable {
            Some(store) => {
                let entries = store.compact()?;
                info!(target: "thingdb::engine", entries, "Compacted record log");
                Ok(entries)
            }
            None => Ok(0),
        }
    }
}
