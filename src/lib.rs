//! thingdb - dynamic-schema record store
//!
//! thingdb stores two kinds of records, Things and Actions. Each record has
//! a class, a context annotation and a property bag whose values are
//! numbers, strings, booleans, or typed cross-references to other records
//! (on this node or a remote one).
//!
//! # Quick Start
//!
//! ```ignore
//! use thingdb::{Command, Database, Executor, ResourceFamily};
//!
//! thingdb::init_logging();
//! let executor = Executor::new(Database::open("/data/things")?);
//!
//! let output = executor.execute(Command::CreateRecord {
//!     family: ResourceFamily::Actions,
//!     class: "TestAction".into(),
//!     context: "blurgh".into(),
//!     schema: serde_json::json!({"testNumber": 41.0}),
//! })?;
//! ```
//!
//! # Architecture
//!
//! All request handling goes through the [`Executor`] and its command API.
//! [`Database`] is exported so callers can open and configure a store; the
//! storage, locking and durability layers stay internal.

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// Command API
pub use thingdb_executor::*;

// Opening and configuring a store
pub use thingdb_engine::{
    ClassRegistry, ClassSchema, Database, DatabaseBuilder, DurabilityMode, EngineConfig,
    OpenRegistry, PropertyType, UpdateMode,
};

// Record model
pub use thingdb_core::{
    CrossRef, PatchDocument, PropertyBag, PropertyValue, Record, RecordId, RecordKind, TargetType,
};

/// Install a `tracing` subscriber filtered by `RUST_LOG`
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it again once a
/// subscriber is installed does nothing.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::info!("Initialized {} v{}", NAME, VERSION);
    }
}
