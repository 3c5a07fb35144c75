//! Cross-reference handlers.

use thingdb_core::{RecordId, RecordKind};
use thingdb_engine::Database;

use super::fetch_in;
use crate::{Output, Result};

/// Handle ResolveReference command.
pub fn resolve(db: &Database, kind: RecordKind, id: RecordId, property: String) -> Result<Output> {
    fetch_in(db, kind, &id)?;
    let target = db.resolve_property(&id, &property)?;
    Ok(Output::Record(target))
}
