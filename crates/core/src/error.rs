//! Error types for thingdb
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `Validation` | create / full update: class or schema mismatch |
//! | `NotFound` | any operation addressing an unknown or deleted id |
//! | `Patch` | malformed or inapplicable patch operation |
//! | `Reference` | cross-reference validation and resolution |
//! | `Storage`, `Serialization`, `Corruption`, `Io` | persistence backends |
//! | `Config` | configuration loading |

use crate::types::RecordId;
use crate::value::ValueError;
use std::io;
use thiserror::Error;

/// Result type alias for thingdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the record store
#[derive(Debug, Error)]
pub enum Error {
    /// Class or schema failed registered-schema checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record id unknown or deleted
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Patch operation malformed or not applicable
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// Cross-reference validation or resolution failure
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted reason
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation(reason.into())
    }

    /// Whether this error reports an unknown identity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<ValueError> for Error {
    fn from(e: ValueError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Reasons a patch batch is rejected
///
/// The first failing operation aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// `op` is not one of add/remove/replace
    #[error("unsupported operation '{0}'")]
    UnsupportedOp(String),

    /// `path` is not rooted at `/schema/<property>` or is too deep
    #[error("unsupported path '{0}'")]
    UnsupportedPath(String),

    /// replace/remove addressed a property that does not exist
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// add/replace without a value
    #[error("operation '{op}' at {path} requires a value")]
    MissingValue {
        /// Operation name
        op: String,
        /// Target path
        path: String,
    },

    /// Value could not be converted into a property value
    #[error("invalid value at {path}: {reason}")]
    InvalidValue {
        /// Target path
        path: String,
        /// Why conversion failed
        reason: String,
    },
}

/// Cross-reference validation and resolution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// `type` names neither a kind nor a known class
    #[error("invalid reference type '{0}'")]
    InvalidType(String),

    /// No record with the target id exists at the location, or it has a different kind/class
    #[error("reference target {id} of type {target_type} not found at '{location}'")]
    TargetNotFound {
        /// Referenced id
        id: RecordId,
        /// Declared target type
        target_type: String,
        /// Location the lookup went to
        location: String,
    },

    /// Remote node did not answer within the configured bound
    #[error("timed out resolving {id} at '{location}'")]
    Timeout {
        /// Referenced id
        id: RecordId,
        /// Remote location
        location: String,
    },

    /// Remote node answered, but not with a usable record
    #[error("remote node '{location}' failed: {reason}")]
    RemoteFailure {
        /// Remote location
        location: String,
        /// Failure detail
        reason: String,
    },
}
