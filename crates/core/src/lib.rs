//! Core types and traits for thingdb
//!
//! This crate defines the foundational types used throughout the system:
//! - RecordId / RecordKind: identity and Thing/Action discriminator
//! - PropertyValue / CrossRef: the closed set of dynamically-typed property values
//! - PropertyBag: the `schema` payload of a record
//! - Record: a stored Thing or Action
//! - PatchDocument / PatchOperation: wire and parsed forms of patch operations
//! - Error: error type hierarchy (validation, not found, patch, reference, storage)
//! - Traits: injected collaborators (RecordStorage, SchemaRegistry)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod patch;
pub mod record;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{Error, PatchError, ReferenceError, Result};
pub use patch::{CrossRefField, FieldValue, PatchDocument, PatchOp, PatchOperation, PatchPath, PatchValue};
pub use record::Record;
pub use schema::PropertyBag;
pub use traits::{RecordStorage, SchemaRegistry};
pub use types::{RecordId, RecordKind};
pub use value::{CrossRef, PropertyValue, TargetType, ValueError};
