//! Disk-backed record storage
//!
//! `DurableStore` keeps the working set in a `ShardedStore` and records
//! every mutation in a `RecordLog` before applying it in memory. Reads are
//! served from memory only.

use crate::config::LogConfig;
use crate::encoding::LogEntry;
use crate::log::{DurabilityMode, RecordLog};
use parking_lot::RwLock;
use std::path::Path;
use thingdb_core::{Record, RecordId, RecordKind, RecordStorage, Result};
use thingdb_storage::ShardedStore;
use tracing::info;

/// Log-backed `RecordStorage`
#[derive(Debug)]
pub struct DurableStore {
    memory: ShardedStore,
    log: RecordLog,
    /// Writers share, compaction takes it exclusively
    gate: RwLock<()>,
}

impl DurableStore {
    /// Open the log at `path` and replay it into memory
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or is corrupt.
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        Self::open_with_config(path, LogConfig::default().with_mode(mode))
    }

    /// Open the log at `path` with explicit log parameters and replay it
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid, or as [`DurableStore::open`].
    pub fn open_with_config(path: impl AsRef<Path>, config: LogConfig) -> Result<Self> {
        let (log, entries) = RecordLog::open_with_config(path, config)?;
        let memory = ShardedStore::new();

        let mut puts = 0usize;
        let mut deletes = 0usize;
        for entry in entries {
            match entry {
                LogEntry::Put(record) => {
                    memory.insert(record);
                    puts += 1;
                }
                LogEntry::Delete(id) => {
                    memory.remove(&id);
                    deletes += 1;
                }
            }
        }

        info!(
            target: "thingdb::durability",
            path = %log.path().display(),
            puts,
            deletes,
            records = memory.len(),
            "Replayed record log"
        );

        Ok(Self {
            memory,
            log,
            gate: RwLock::new(()),
        })
    }

    /// Rewrite the log so it holds one put per live record
    ///
    /// Returns the number of entries in the new log.
    ///
    /// # Errors
    ///
    /// Returns an error if the new log cannot be written.
    pub fn compact(&self) -> Result<usize> {
        let _exclusive = self.gate.write();
        let entries: Vec<LogEntry> = self
            .memory
            .records(None)
            .into_iter()
            .map(LogEntry::Put)
            .collect();
        self.log.rewrite(&entries)
    }

    /// Force buffered log data to disk
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&self) -> Result<()> {
        self.log.sync()
    }

    /// The underlying log
    pub fn log(&self) -> &RecordLog {
        &self.log
    }
}

impl RecordStorage for DurableStore {
    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.memory.get_cloned(id))
    }

    fn put(&self, record: Record) -> Result<()> {
        let _shared = self.gate.read();
        let entry = LogEntry::Put(record);
        self.log.append(&entry)?;
        if let LogEntry::Put(record) = entry {
            self.memory.insert(record);
        }
        Ok(())
    }

    fn delete(&self, id: &RecordId) -> Result<Option<Record>> {
        let _shared = self.gate.read();
        if !self.memory.contains(id) {
            return Ok(None);
        }
        self.log.append(&LogEntry::Delete(*id))?;
        Ok(self.memory.remove(id))
    }

    fn scan(&self, kind: Option<RecordKind>) -> Result<Vec<Record>> {
        Ok(self.memory.records(kind))
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LOG_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;
    use thingdb_core::PropertyBag;

    fn thing(number: f64) -> Record {
        Record::new(
            RecordKind::Thing,
            "TestThing",
            "",
            PropertyBag::new().with("testNumber", number),
        )
    }

    #[test]
    fn test_replay_restores_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);

        let kept = thing(1.0);
        let mut updated = thing(2.0);
        let removed = thing(3.0);
        {
            let store = DurableStore::open(&path, DurabilityMode::Standard).unwrap();
            store.put(kept.clone()).unwrap();
            store.put(updated.clone()).unwrap();
            store.put(removed.clone()).unwrap();

            updated.schema.insert("testNumber", 20.0);
            updated.touch();
            store.put(updated.clone()).unwrap();
            assert!(store.delete(&removed.id).unwrap().is_some());
        }

        let store = DurableStore::open(&path, DurabilityMode::Standard).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&kept.id).unwrap(), Some(kept));
        assert_eq!(store.get(&updated.id).unwrap(), Some(updated));
        assert!(store.get(&removed.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join(LOG_FILE_NAME), DurabilityMode::Standard).unwrap();
        assert!(store.delete(&RecordId::new()).unwrap().is_none());
        assert_eq!(store.log().appended(), 0);
    }

    #[test]
    fn test_compact_shrinks_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let store = DurableStore::open(&path, DurabilityMode::Standard).unwrap();

        let mut record = thing(0.0);
        store.put(record.clone()).unwrap();
        for i in 1..50 {
            record.schema.insert("testNumber", i as f64);
            record.touch();
            store.put(record.clone()).unwrap();
        }
        let gone = thing(99.0);
        store.put(gone.clone()).unwrap();
        store.delete(&gone.id).unwrap();

        let before = fs::metadata(&path).unwrap().len();
        assert_eq!(store.compact().unwrap(), 1);
        let after = fs::metadata(&path).unwrap().len();
        assert!(after < before);
        drop(store);

        let reopened = DurableStore::open(&path, DurabilityMode::Standard).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(&record.id).unwrap().map(|r| r.version), Some(50));
    }

    #[test]
    fn test_scan_by_kind() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join(LOG_FILE_NAME), DurabilityMode::Always).unwrap();
        store.put(thing(1.0)).unwrap();
        store
            .put(Record::new(RecordKind::Action, "TestAction", "", PropertyBag::new()))
            .unwrap();
        assert_eq!(store.scan(Some(RecordKind::Thing)).unwrap().len(), 1);
        assert_eq!(store.scan(Some(RecordKind::Action)).unwrap().len(), 1);
        assert_eq!(store.scan(None).unwrap().len(), 2);
        store.sync().unwrap();
    }
}
