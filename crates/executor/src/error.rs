//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: each variant has typed fields for error details
//! - **Serializable**: can be converted to/from JSON
//!
//! | Variant | Status |
//! |---------|--------|
//! | `NotFound` | 404 |
//! | `NotImplemented` | 501 |
//! | `InvalidInput`, `Validation`, `Patch`, `Reference` | 422 |
//! | `Timeout` | 504 |
//! | `Io`, `Serialization`, `Internal` | 500 |

use serde::{Deserialize, Serialize};

/// Command execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// Record unknown, deleted, or not part of the addressed family
    #[error("record not found: {id}")]
    NotFound { id: String },

    // ==================== Declined ====================
    /// Operation not offered for this resource family
    #[error("{operation} is not implemented for {family}")]
    NotImplemented { family: String, operation: String },

    // ==================== Validation Errors ====================
    /// Request payload malformed
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Class or schema rejected
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// Patch batch rejected
    #[error("patch failed: {reason}")]
    Patch { reason: String },

    /// Reference invalid or unresolvable
    #[error("reference error: {reason}")]
    Reference { reason: String },

    /// Remote node did not answer in time
    #[error("timeout: {reason}")]
    Timeout { reason: String },

    // ==================== System Errors ====================
    /// I/O error
    #[error("I/O error: {reason}")]
    Io { reason: String },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Internal error (storage failure, corruption, bad configuration)
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// HTTP status a REST boundary would answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::NotImplemented { .. } => 501,
            Error::InvalidInput { .. }
            | Error::Validation { .. }
            | Error::Patch { .. }
            | Error::Reference { .. } => 422,
            Error::Timeout { .. } => 504,
            Error::Io { .. } | Error::Serialization { .. } | Error::Internal { .. } => 500,
        }
    }
}

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
