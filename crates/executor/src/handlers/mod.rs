//! Command handlers organized by concern.
//!
//! | Module | Commands |
//! |--------|----------|
//! | `record` | create, get, list, update, patch, delete |
//! | `reference` | resolve |
//! | `database` | ping, flush, compact |

pub mod database;
pub mod record;
pub mod reference;

use crate::{Error, ResourceFamily, Result};
use thingdb_core::{Record, RecordId, RecordKind};
use thingdb_engine::Database;

/// Record kind served by `family`, or `NotImplemented` for the others
pub(crate) fn family_kind(family: ResourceFamily, operation: &str) -> Result<RecordKind> {
    family.kind().ok_or_else(|| Error::NotImplemented {
        family: family.as_str().to_string(),
        operation: operation.to_string(),
    })
}

/// Fetch a record and make sure it lives under `kind`
///
/// An Action addressed through `/things` (or the reverse) is reported as
/// missing.
pub(crate) fn fetch_in(db: &Database, kind: RecordKind, id: &RecordId) -> Result<Record> {
    let record = db.get(id)?;
    if record.kind != kind {
        return Err(Error::NotFound { id: id.to_string() });
    }
    Ok(record)
}
