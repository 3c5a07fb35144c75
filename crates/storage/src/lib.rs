//! Storage layer for thingdb
//!
//! This crate implements the in-memory record backend:
//! - ShardedStore: DashMap keyed by RecordId with FxHash
//!
//! # Concurrency
//!
//! - Lock-free reads via DashMap
//! - Writes only lock the target shard
//! - Records are replaced whole, so readers never see a partial write

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::ShardedStore;
