//! Durability layer for thingdb
//!
//! This crate makes record writes survive restarts:
//! - config: `LogConfig`, sync policy and entry size ceiling
//! - encoding: CRC-checked entry framing
//! - log: append-only record log with configurable sync policy
//! - store: `DurableStore`, a `RecordStorage` that logs before it applies
//!
//! On open the log is replayed into memory. A torn final entry (the
//! process died mid-append) is truncated away; corruption anywhere else
//! refuses to open and leaves the file as it was.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod encoding;
pub mod log;
pub mod store;

pub use config::LogConfig;
pub use encoding::{LogEntry, MAX_ENTRY_LEN};
pub use log::{DurabilityMode, RecordLog, LOG_FILE_NAME};
pub use store::DurableStore;
