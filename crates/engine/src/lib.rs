//! Record engine for thingdb
//!
//! This crate orchestrates all lower layers:
//! - Database: the record store (create, get, update, patch, delete, resolve)
//! - Patch Engine: all-or-nothing JSON-patch batches on the property bag
//! - Update Engine: full-document updates, replace or merge
//! - Resolver: local and remote cross-reference resolution
//! - Registries: strict class schemas or open acceptance
//! - Configuration via `thingdb.toml`
//!
//! The engine is the only component that knows about:
//! - Per-record mutation locking
//! - Cross-layer coordination (registry + storage + resolver)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod patch;
pub mod registry;
pub mod resolver;
pub mod update;
pub mod validation;

pub use database::{Database, DatabaseBuilder, EngineConfig, UpdateMode, CONFIG_FILE_NAME};
pub use patch::PatchEngine;
pub use registry::{ClassRegistry, ClassSchema, OpenRegistry, PropertyType};
pub use resolver::{HttpRemoteFetcher, NoRemote, NodeIdentity, RemoteFetcher, Resolver};
pub use update::UpdateEngine;
pub use thingdb_durability::DurabilityMode;
