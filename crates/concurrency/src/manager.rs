//! Per-record lock manager
//!
//! Every mutation of a record runs inside `with_lock(id, ..)`. Two
//! mutations of the same id never overlap, so a patch always starts from
//! the state the previous mutation left behind.
//!
//! ## Lock Sequence
//!
//! ```text
//! 1. Look up (or create) the Arc<Mutex> for the id in the DashMap
//! 2. Clone the Arc and release the map shard
//! 3. Lock the mutex and run the critical section
//! 4. Drop the guard
//! ```
//!
//! The map shard is never held while waiting on a record mutex, so a slow
//! critical section on one id cannot stall lookups of unrelated ids that
//! hash into the same shard.

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thingdb_core::RecordId;
use tracing::trace;

type RecordLock = Arc<Mutex<()>>;

/// Counters describing lock usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Critical sections entered
    pub acquisitions: u64,
    /// Acquisitions that had to wait for another holder
    pub contended: u64,
    /// Locks currently tracked
    pub tracked: usize,
}

/// Serializes mutations per record id
///
/// Locks are created on first use. `remove` drops the lock of a record
/// that has been deleted; ids are never reused, so no later caller can
/// race on a stale lock.
#[derive(Debug, Default)]
pub struct LockManager {
    locks: DashMap<RecordId, RecordLock, BuildHasherDefault<FxHasher>>,
    acquisitions: AtomicU64,
    contended: AtomicU64,
}

impl LockManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &RecordId) -> RecordLock {
        // Clone the Arc so the shard guard is released before we block
        self.locks
            .entry(*id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Run `f` while holding the lock for `id`
    pub fn with_lock<F, T>(&self, id: &RecordId, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let lock = self.lock_for(id);
        let _guard = match lock.try_lock() {
            Some(guard) => guard,
            None => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                trace!(target: "thingdb::concurrency", id = %id, "waiting for record lock");
                lock.lock()
            }
        };
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        f()
    }

    /// Forget the lock of a deleted record
    pub fn remove(&self, id: &RecordId) {
        self.locks.remove(id);
    }

    /// Number of locks currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no locks are tracked
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Snapshot of the usage counters
    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            tracked: self.locks.len(),
        }
    }
}
