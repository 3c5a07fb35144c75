//! Error conversion from internal error types.

use crate::Error;
use thingdb_core::{Error as CoreError, ReferenceError};

/// Convert an engine error to an executor Error, keeping its message.
impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(id) => Error::NotFound { id: id.to_string() },
            CoreError::Validation(reason) => Error::Validation { reason },
            CoreError::Patch(e) => Error::Patch {
                reason: e.to_string(),
            },
            CoreError::Reference(e @ ReferenceError::Timeout { .. }) => Error::Timeout {
                reason: e.to_string(),
            },
            CoreError::Reference(e) => Error::Reference {
                reason: e.to_string(),
            },
            CoreError::Io(e) => Error::Io {
                reason: e.to_string(),
            },
            CoreError::Serialization(reason) => Error::Serialization { reason },
            e @ (CoreError::Storage(_) | CoreError::Corruption(_) | CoreError::Config(_)) => {
                Error::Internal {
                    reason: e.to_string(),
                }
            }
        }
    }
}
