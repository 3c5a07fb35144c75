//! Sharded record storage
//!
//! DashMap keyed by `RecordId` with FxHash. Lock-free reads, writes only
//! lock the shard holding the id, so different records never contend.
//!
//! Records are stored whole. A `put` swaps the complete record in one
//! shard operation, which is what gives patches and full updates their
//! all-or-nothing visibility to readers.

use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use thingdb_core::{Record, RecordId, RecordKind, RecordStorage, Result};
use tracing::trace;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// In-memory record store
///
/// # Example
///
/// ```ignore
/// let store = ShardedStore::new();
/// store.put(record)?;
/// let current = store.get(&id)?;
/// ```
#[derive(Debug, Default)]
pub struct ShardedStore {
    records: DashMap<RecordId, Record, FxBuildHasher>,
    /// Count of applied puts and deletes
    writes: AtomicU64,
}

impl ShardedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with expected number of records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
            writes: AtomicU64::new(0),
        }
    }

    /// Check if a record exists
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of writes applied since creation
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&self, record: Record) -> Option<Record> {
        trace!(target: "thingdb::storage", id = %record.id, version = record.version, "put");
        let previous = self.records.insert(record.id, record);
        self.writes.fetch_add(1, Ordering::AcqRel);
        previous
    }

    /// Remove a record
    pub fn remove(&self, id: &RecordId) -> Option<Record> {
        let removed = self.records.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            trace!(target: "thingdb::storage", id = %id, "delete");
            self.writes.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    /// Clone of the current record
    pub fn get_cloned(&self, id: &RecordId) -> Option<Record> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Records ordered by id, optionally restricted to one kind
    pub fn records(&self, kind: Option<RecordKind>) -> Vec<Record> {
        let mut out: Vec<Record> = self
            .records
            .iter()
            .filter(|entry| kind.map_or(true, |k| entry.value().kind == k))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Drop every record
    pub fn clear(&self) {
        self.records.clear();
    }
}

impl RecordStorage for ShardedStore {
    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.get_cloned(id))
    }

    fn put(&self, record: Record) -> Result<()> {
        self.insert(record);
        Ok(())
    }

    fn delete(&self, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.remove(id))
    }

    fn scan(&self, kind: Option<RecordKind>) -> Result<Vec<Record>> {
        Ok(self.records(kind))
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
