//! Test modules for the executor crate.


use std::sync::Arc;

use serde_json::json;
use thingdb_core::{Record, RecordKind};
use thingdb_engine::{ClassRegistry, ClassSchema, Database, PropertyType};

use crate::{Command, Executor, Output, ResourceFamily};

/// Executor over an in-memory database that accepts any class.
pub(crate) fn open_executor() -> Executor {
    Executor::new(Database::ephemeral())
}

/// Executor over an in-memory database with the test classes registered.
pub(crate) fn strict_executor() -> Executor {
    let registry = ClassRegistry::new()
        .with_class(
            ClassSchema::new("TestThing", RecordKind::Thing)
                .property("testString", PropertyType::String)
                .property("testNumber", PropertyType::Number),
        )
        .unwrap()
        .with_class(
            ClassSchema::new("TestAction", RecordKind::Action)
                .property("testNumber", PropertyType::Number)
                .property("testString", PropertyType::String)
                .property("testBoolean", PropertyType::Boolean)
                .property("testCref", PropertyType::cref(["TestThing"])),
        )
        .unwrap();
    let db = Database::builder()
        .registry(Arc::new(registry))
        .open()
        .unwrap();
    Executor::new(db)
}

/// Create a record through the executor and return it.
pub(crate) fn create(executor: &Executor, family: ResourceFamily, class: &str) -> Record {
    let output = executor
        .execute(Command::CreateRecord {
            family,
            class: class.to_string(),
            context: String::new(),
            schema: json!({}),
        })
        .unwrap();
    match output {
        Output::Record(record) => record,
        other => panic!("Expected Record output, got {:?}", other),
    }
}

/// Unwrap an `Output::Record`.
pub(crate) fn record_of(output: Output) -> Record {
    match output {
        Output::Record(record) => record,
        other => panic!("Expected Record output, got {:?}", other),
    }
}
