//! Append-only record log
//!
//! One file, a sequence of encoded entries with no header. Appends go
//! through a single buffered writer behind a mutex, so entries from
//! concurrent writers never interleave.
//!
//! # Recovery
//!
//! `RecordLog::open` reads the whole file and decodes it front to back:
//! - an incomplete final entry is a torn append and is truncated away
//! - a damaged final entry (bad CRC) is treated the same way
//! - a zero-filled tail (preallocated blocks after a crash) is truncated
//! - damage followed by further data is corruption and fails the open,
//!   including a length field that runs past the end of the file while a
//!   whole entry still follows it
//! - a length field above the configured ceiling is always corruption
//!
//! A corrupt log is never truncated.

use crate::config::LogConfig;
use crate::encoding::{decode_entry, encode_entry, DecodeError, LogEntry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thingdb_core::{Error, Result};
use tracing::{debug, error, info, warn};

/// File name of the record log inside a data directory
pub const LOG_FILE_NAME: &str = "records.log";

/// When appended entries reach the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// Flush to the OS after every append, let the OS decide when to sync
    ///
    /// Survives process crashes, may lose the last writes on power loss.
    #[default]
    Standard,
    /// fsync after every append
    Always,
}

impl DurabilityMode {
    /// Config-file spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            DurabilityMode::Standard => "standard",
            DurabilityMode::Always => "always",
        }
    }
}

/// Buffered file handle plus the length of the log up to its last whole entry
struct Appender {
    file: BufWriter<File>,
    good_len: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

/// Append-only log of record mutations
pub struct RecordLog {
    path: PathBuf,
    writer: Mutex<Appender>,
    config: LogConfig,
    appended: AtomicU64,
}

impl std::fmt::Debug for RecordLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLog")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("appended", &self.appended.load(Ordering::Relaxed))
            .finish()
    }
}

impl RecordLog {
    /// Open (or create) the log at `path` and return every valid entry
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or opened, and
    /// [`Error::Corruption`] if a damaged entry is followed by more data.
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<(Self, Vec<LogEntry>)> {
        Self::open_with_config(path, LogConfig::default().with_mode(mode))
    }

    /// Open (or create) the log at `path` with explicit parameters
    ///
    /// A corrupt log is left exactly as found; only a torn tail is
    /// truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid `config`, otherwise as
    /// [`RecordLog::open`].
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: LogConfig,
    ) -> Result<(Self, Vec<LogEntry>)> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut bytes = Vec::new();
        if path.exists() {
            File::open(&path)?.read_to_end(&mut bytes)?;
        }

        let (entries, valid_len) = read_entries(&path, &bytes, config.max_entry_len)?;
        if valid_len < bytes.len() {
            warn!(
                target: "thingdb::durability",
                path = %path.display(),
                valid_len,
                file_len = bytes.len(),
                "Truncating torn tail of record log"
            );
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(
            target: "thingdb::durability",
            path = %path.display(),
            entries = entries.len(),
            mode = config.mode.as_str(),
            max_entry_len = config.max_entry_len,
            "Opened record log"
        );

        Ok((
            Self {
                path,
                writer: Mutex::new(Appender {
                    file: BufWriter::new(file),
                    good_len: valid_len as u64,
                    poisoned: false,
                }),
                config,
                appended: AtomicU64::new(0),
            },
            entries,
        ))
    }

    /// Append one entry and apply the sync policy
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exceeds the configured ceiling, or if
    /// encoding or the write fails. A failed write is cut back to the last
    /// whole entry; if that also fails the log refuses further appends.
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let bytes = encode_entry(entry)?;
        let body_len = bytes.len() - 4;
        if body_len > self.config.max_entry_len {
            return Err(Error::Storage(format!(
                "log entry of {} bytes exceeds maximum of {} bytes",
                body_len, self.config.max_entry_len
            )));
        }

        let mut writer = self.writer.lock();
        if writer.poisoned {
            return Err(Error::Storage(format!(
                "record log {} is closed after a failed append",
                self.path.display()
            )));
        }
        if let Err(e) = write_through(&mut writer.file, &bytes, self.config.mode) {
            self.roll_back(&mut writer);
            return Err(e);
        }
        writer.good_len += bytes.len() as u64;
        self.appended.fetch_add(1, Ordering::Relaxed);
        debug!(target: "thingdb::durability", id = %entry.record_id(), len = bytes.len(), "Appended log entry");
        Ok(())
    }

    /// Discard whatever a failed append left behind
    ///
    /// Buffered bytes are dropped unwritten and the file is cut back to
    /// `good_len`. Poisons the log if either step fails.
    fn roll_back(&self, writer: &mut Appender) {
        let restored = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| {
                file.set_len(writer.good_len)?;
                file.sync_all()
            })
            .and_then(|()| OpenOptions::new().append(true).open(&self.path));

        match restored {
            Ok(file) => {
                let failed = std::mem::replace(&mut writer.file, BufWriter::new(file));
                // into_parts hands back the buffer without flushing it
                let _ = failed.into_parts();
                warn!(
                    target: "thingdb::durability",
                    path = %self.path.display(),
                    good_len = writer.good_len,
                    "Rolled back failed log append"
                );
            }
            Err(e) => {
                writer.poisoned = true;
                // Keep the torn bytes from reaching disk on a later flush or drop
                if let Ok(handle) = writer.file.get_ref().try_clone() {
                    let failed = std::mem::replace(&mut writer.file, BufWriter::new(handle));
                    let _ = failed.into_parts();
                }
                error!(
                    target: "thingdb::durability",
                    path = %self.path.display(),
                    error = %e,
                    "Could not roll back failed log append; log closed for writes"
                );
            }
        }
    }

    /// Flush buffered bytes and fsync
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the sync fails, and [`Error::Storage`] if a
    /// failed append closed the log.
    pub fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        if writer.poisoned {
            return Err(Error::Storage(format!(
                "record log {} is closed after a failed append",
                self.path.display()
            )));
        }
        writer.file.flush()?;
        writer.file.get_ref().sync_all()?;
        Ok(())
    }

    /// Replace the log contents with `entries`
    ///
    /// The new log is written to a sibling file, synced, and renamed over
    /// the old one. Appends are blocked for the duration. A successful
    /// rewrite also reopens a log closed by a failed append.
    ///
    /// # Errors
    ///
    /// Returns an error if the new file cannot be written; the old log is
    /// left in place in that case.
    pub fn rewrite<'a, I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut writer = self.writer.lock();
        if !writer.poisoned {
            writer.file.flush()?;
        }

        let tmp_path = self.path.with_extension("log.tmp");
        let mut count = 0;
        let mut written = 0u64;
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for entry in entries {
                let bytes = encode_entry(entry)?;
                tmp.write_all(&bytes)?;
                written += bytes.len() as u64;
                count += 1;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let old = std::mem::replace(&mut writer.file, BufWriter::new(file));
        let _ = old.into_parts();
        writer.good_len = written;
        writer.poisoned = false;

        info!(target: "thingdb::durability", path = %self.path.display(), entries = count, "Rewrote record log");
        Ok(count)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync policy in use
    pub fn mode(&self) -> DurabilityMode {
        self.config.mode
    }

    /// Parameters the log was opened with
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Entries appended since open
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    /// Bytes of whole entries currently in the log
    pub fn len(&self) -> u64 {
        self.writer.lock().good_len
    }

    /// True if the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn write_through(file: &mut BufWriter<File>, bytes: &[u8], mode: DurabilityMode) -> Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    if mode == DurabilityMode::Always {
        file.get_ref().sync_data()?;
    }
    Ok(())
}

/// True if some whole, valid entry starts anywhere in `bytes[1..]`
///
/// A torn append only ever leaves a prefix of one entry, so finding a
/// later entry means the damage is in the middle of the log.
fn valid_entry_follows(bytes: &[u8], max_len: usize) -> bool {
    (1..bytes.len()).any(|at| decode_entry(&bytes[at..], max_len).is_ok())
}

/// Decode every entry; returns the entries and the length of the valid prefix
fn read_entries(path: &Path, bytes: &[u8], max_len: usize) -> Result<(Vec<LogEntry>, usize)> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        let reason = match decode_entry(rest, max_len) {
            Ok((entry, consumed)) => {
                entries.push(entry);
                offset += consumed;
                continue;
            }
            Err(DecodeError::Incomplete) => {
                if !valid_entry_follows(rest, max_len) {
                    break;
                }
                format!(
                    "entry length runs past end of file ({} bytes remain)",
                    rest.len()
                )
            }
            Err(DecodeError::Corrupt { reason, span }) => {
                let is_tail = match span {
                    Some(span) => span == rest.len(),
                    None => rest.iter().all(|b| *b == 0),
                };
                if !is_tail {
                    reason
                } else {
                    warn!(
                        target: "thingdb::durability",
                        path = %path.display(),
                        offset,
                        reason = %reason,
                        "Damaged final log entry"
                    );
                    break;
                }
            }
        };
        return Err(Error::Corruption(format!(
            "{} at offset {}: {}",
            path.display(),
            offset,
            reason
        )));
    }

    Ok((entries, offset))
}
