//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value as Json};
use tempfile::TempDir;
pub use thingdb::{
    Command, Database, DurabilityMode, EngineConfig, Error, Executor, Output, PatchDocument,
    PropertyValue, Record, RecordId, RecordKind, ResourceFamily,
};

/// File name of the schema document written by [`write_schema`]
pub const SCHEMA_FILE: &str = "schema.json";

/// Schema document with the classes used across the suites
pub fn schema_document() -> Json {
    json!({
        "things": [
            {
                "class": "TestThing",
                "properties": [
                    {"name": "testString", "dataType": "string"},
                    {"name": "testNumber", "dataType": "number"},
                    {"name": "testBoolean", "dataType": "boolean"},
                    {"name": "testCref", "dataType": ["TestThing", "TestAction"]}
                ]
            },
            {"class": "OtherThing", "properties": []}
        ],
        "actions": [
            {
                "class": "TestAction",
                "properties": [
                    {"name": "testString", "dataType": "string"},
                    {"name": "testNumber", "dataType": "number"},
                    {"name": "testBoolean", "dataType": "boolean"},
                    {"name": "testCref", "dataType": ["TestThing"]}
                ]
            }
        ]
    })
}

/// Write the schema document into `dir`
pub fn write_schema(dir: &Path) {
    let text = serde_json::to_string_pretty(&schema_document()).unwrap();
    std::fs::write(dir.join(SCHEMA_FILE), text).unwrap();
}

/// Configuration pointing at the schema written by [`write_schema`]
pub fn strict_config(durability: DurabilityMode) -> EngineConfig {
    EngineConfig {
        schema: Some(SCHEMA_FILE.into()),
        durability,
        ..EngineConfig::default()
    }
}

/// Open a schema-enforcing database in `dir`
pub fn open_strict(dir: &Path) -> Arc<Database> {
    write_schema(dir);
    Database::open_with_config(dir, strict_config(DurabilityMode::Standard)).unwrap()
}

/// Temporary directory plus an executor over a schema-enforcing database
pub fn strict_executor() -> (TempDir, Executor) {
    let dir = TempDir::new().unwrap();
    let db = open_strict(dir.path());
    (dir, Executor::new(db))
}

/// Unwrap an `Output::Record`
pub fn expect_record(output: Output) -> Record {
    match output {
        Output::Record(record) => record,
        other => panic!("Expected Record output, got {:?}", other),
    }
}

/// Create a record with an empty schema
pub fn create(executor: &Executor, family: ResourceFamily, class: &str) -> Record {
    create_with(executor, family, class, json!({}))
}

/// Create a record with the given schema
pub fn create_with(executor: &Executor, family: ResourceFamily, class: &str, schema: Json) -> Record {
    expect_record(
        executor
            .execute(Command::CreateRecord {
                family,
                class: class.to_string(),
                context: String::new(),
                schema,
            })
            .unwrap(),
    )
}

/// Fetch a record, returning the HTTP-style status on failure
pub fn get(executor: &Executor, family: ResourceFamily, id: RecordId) -> Result<Record, u16> {
    executor
        .execute(Command::GetRecord { family, id })
        .map(expect_record)
        .map_err(|e| e.status_code())
}

/// Local cross-reference JSON as sent by clients
pub fn cref_json(id: RecordId, target_type: &str) -> Json {
    json!({
        "$cref": id.to_string(),
        "locationUrl": "http://localhost",
        "type": target_type,
    })
}
