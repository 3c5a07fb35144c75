//! Record lifecycle handlers.
//!
//! Raw JSON payloads are converted to property bags here, so a malformed
//! schema is reported as `InvalidInput` before the engine sees it.

use serde_json::Value as Json;
use thingdb_core::{PatchDocument, PropertyBag, RecordId, RecordKind};
use thingdb_engine::Database;

use super::fetch_in;
use crate::{Error, Output, Result};

fn parse_schema(schema: &Json) -> Result<PropertyBag> {
    PropertyBag::from_json(schema).map_err(|e| Error::InvalidInput {
        reason: e.to_string(),
    })
}

/// Handle CreateRecord command.
pub fn create(
    db: &Database,
    kind: RecordKind,
    class: String,
    context: String,
    schema: Json,
) -> Result<Output> {
    let bag = parse_schema(&schema)?;
    let record = db.create(kind, &class, context, bag)?;
    Ok(Output::Record(record))
}

/// Handle GetRecord command.
pub fn get(db: &Database, kind: RecordKind, id: RecordId) -> Result<Output> {
    Ok(Output::Record(fetch_in(db, kind, &id)?))
}

/// Handle ListRecords command.
pub fn list(db: &Database, kind: RecordKind) -> Result<Output> {
    Ok(Output::Records(db.list(kind)?))
}

/// Handle UpdateRecord command.
pub fn update(
    db: &Database,
    kind: RecordKind,
    id: RecordId,
    class: String,
    context: String,
    schema: Json,
) -> Result<Output> {
    let bag = parse_schema(&schema)?;
    fetch_in(db, kind, &id)?;
    let record = db.full_update(&id, &class, context, bag)?;
    Ok(Output::Record(record))
}

/// Handle PatchRecord command.
pub fn patch(
    db: &Database,
    kind: RecordKind,
    id: RecordId,
    operations: Vec<PatchDocument>,
) -> Result<Output> {
    fetch_in(db, kind, &id)?;
    let record = db.patch(&id, &operations)?;
    Ok(Output::Record(record))
}

/// Handle DeleteRecord command.
pub fn delete(db: &Database, kind: RecordKind, id: RecordId) -> Result<Output> {
    fetch_in(db, kind, &id)?;
    db.delete(&id)?;
    Ok(Output::Deleted)
}
