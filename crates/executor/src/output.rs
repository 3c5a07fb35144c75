//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant.

use serde::{Deserialize, Serialize};
use thingdb_core::Record;

/// Successful command execution results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// A single record (create, get, update, patch, resolve)
    Record(Record),

    /// Records of one family (list)
    Records(Vec<Record>),

    /// Record removed (delete)
    Deleted,

    /// Command completed with nothing to report (flush)
    Unit,

    /// Log rewritten
    Compacted {
        /// Live records written to the new log
        records: usize,
    },

    /// Liveness answer
    Pong {
        /// Crate version
        version: String,
    },
}

impl Output {
    /// HTTP status a REST boundary would answer with
    ///
    /// 204 for a delete, 200 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            Output::Deleted => 204,
            _ => 200,
        }
    }
}
