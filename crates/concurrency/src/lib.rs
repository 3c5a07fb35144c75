//! Concurrency layer for thingdb
//!
//! Mutations on the same record are serialized through a per-id mutex:
//! - LockManager: lazily created lock per RecordId
//! - Operations on different ids never block each other
//! - Reads take no lock; storage swaps whole records

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;

pub use manager::{LockManager, LockStats};
