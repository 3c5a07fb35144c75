//! Command enum defining all record store operations.
//!
//! Commands are:
//! - **Self-contained**: all parameters needed for execution are in the variant
//! - **Serializable**: can be converted to/from JSON
//! - **Pure data**: no closures or executable code
//!
//! Payloads that carry a property bag keep it as raw JSON; conversion and
//! validation happen at execution time so malformed values surface as
//! ordinary command errors.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thingdb_core::{PatchDocument, RecordId, RecordKind};

/// REST resource family a command addresses
///
/// Only `Things` and `Actions` are backed by the record store. The other
/// families exist on the boundary but every operation on them is declined
/// with `NotImplemented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    /// `/things`
    Things,
    /// `/actions`
    Actions,
    /// `/keys`
    Keys,
    /// `/adapters`
    Adapters,
    /// `/commands`
    Commands,
}

impl ResourceFamily {
    /// Record kind stored under this family, if any
    pub fn kind(&self) -> Option<RecordKind> {
        match self {
            ResourceFamily::Things => Some(RecordKind::Thing),
            ResourceFamily::Actions => Some(RecordKind::Action),
            ResourceFamily::Keys | ResourceFamily::Adapters | ResourceFamily::Commands => None,
        }
    }

    /// Path segment name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFamily::Things => "things",
            ResourceFamily::Actions => "actions",
            ResourceFamily::Keys => "keys",
            ResourceFamily::Adapters => "adapters",
            ResourceFamily::Commands => "commands",
        }
    }
}

impl From<RecordKind> for ResourceFamily {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Thing => ResourceFamily::Things,
            RecordKind::Action => ResourceFamily::Actions,
        }
    }
}

/// A command is a self-contained, serializable operation.
///
/// # Example
///
/// ```ignore
/// use thingdb_executor::{Command, ResourceFamily};
///
/// let cmd = Command::UpdateRecord {
///     family: ResourceFamily::Actions,
///     id,
///     class: "TestAction".into(),
///     context: "blurgh".into(),
///     schema: serde_json::json!({"testNumber": 41.0}),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Create a record.
    /// Returns: `Output::Record`
    CreateRecord {
        family: ResourceFamily,
        #[serde(rename = "@class")]
        class: String,
        #[serde(rename = "@context", default)]
        context: String,
        #[serde(default)]
        schema: Json,
    },

    /// Fetch a record.
    /// Returns: `Output::Record`
    GetRecord { family: ResourceFamily, id: RecordId },

    /// All records of a family, ordered by id.
    /// Returns: `Output::Records`
    ListRecords { family: ResourceFamily },

    /// Full update.
    /// Returns: `Output::Record`
    UpdateRecord {
        family: ResourceFamily,
        id: RecordId,
        #[serde(rename = "@class")]
        class: String,
        #[serde(rename = "@context", default)]
        context: String,
        #[serde(default)]
        schema: Json,
    },

    /// Apply a batch of patch operations.
    /// Returns: `Output::Record`
    PatchRecord {
        family: ResourceFamily,
        id: RecordId,
        operations: Vec<PatchDocument>,
    },

    /// Delete a record.
    /// Returns: `Output::Deleted`
    DeleteRecord { family: ResourceFamily, id: RecordId },

    /// Dereference the cross-reference held in a property.
    /// Returns: `Output::Record`
    ResolveReference {
        family: ResourceFamily,
        id: RecordId,
        property: String,
    },

    /// Liveness check.
    /// Returns: `Output::Pong`
    Ping,

    /// Force buffered log writes to stable storage.
    /// Returns: `Output::Unit`
    Flush,

    /// Rewrite the record log to one entry per live record.
    /// Returns: `Output::Compacted`
    Compact,
}

impl Command {
    /// Family addressed by the command, None for database-level commands
    pub fn family(&self) -> Option<ResourceFamily> {
        match self {
            Command::CreateRecord { family, .. }
            | Command::GetRecord { family, .. }
            | Command::ListRecords { family }
            | Command::UpdateRecord { family, .. }
            | Command::PatchRecord { family, .. }
            | Command::DeleteRecord { family, .. }
            | Command::ResolveReference { family, .. } => Some(*family),
            Command::Ping | Command::Flush | Command::Compact => None,
        }
    }

    /// Short operation name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateRecord { .. } => "create",
            Command::GetRecord { .. } => "get",
            Command::ListRecords { .. } => "list",
            Command::UpdateRecord { .. } => "update",
            Command::PatchRecord { .. } => "patch",
            Command::DeleteRecord { .. } => "delete",
            Command::ResolveReference { .. } => "resolve",
            Command::Ping => "ping",
            Command::Flush => "flush",
            Command::Compact => "compact",
        }
    }
}
