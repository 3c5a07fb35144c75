//! State survives closing and reopening the data directory.

use serde_json::json;
use tempfile::TempDir;
use thingdb_durability::LOG_FILE_NAME;

use crate::common::*;

fn reopen(dir: &TempDir) -> Executor {
    Executor::new(Database::open(dir.path()).unwrap())
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (thing, action) = {
        let executor = Executor::new(open_strict(dir.path()));
        let thing = create_with(
            &executor,
            ResourceFamily::Things,
            "TestThing",
            json!({"testString": "wibbly wobbly"}),
        );
        let action = create(&executor, ResourceFamily::Actions, "TestAction");
        executor
            .execute(Command::PatchRecord {
                family: ResourceFamily::Actions,
                id: action.id,
                operations: vec![PatchDocument::add("/schema/testCref", cref_json(thing.id, "Thing"))],
            })
            .unwrap();
        (thing, action)
    };

    let executor = reopen(&dir);
    assert_eq!(get(&executor, ResourceFamily::Things, thing.id).unwrap(), thing);

    let action_now = get(&executor, ResourceFamily::Actions, action.id).unwrap();
    assert_eq!(action_now.version, 2);
    let target = expect_record(
        executor
            .execute(Command::ResolveReference {
                family: ResourceFamily::Actions,
                id: action.id,
                property: "testCref".into(),
            })
            .unwrap(),
    );
    assert_eq!(target.id, thing.id);
}

#[test]
fn deletes_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (kept, deleted) = {
        let executor = Executor::new(open_strict(dir.path()));
        let kept = create(&executor, ResourceFamily::Things, "TestThing");
        let deleted = create(&executor, ResourceFamily::Things, "TestThing");
        executor
            .execute(Command::DeleteRecord {
                family: ResourceFamily::Things,
                id: deleted.id,
            })
            .unwrap();
        (kept, deleted)
    };

    let executor = reopen(&dir);
    assert!(get(&executor, ResourceFamily::Things, kept.id).is_ok());
    assert_eq!(get(&executor, ResourceFamily::Things, deleted.id), Err(404));
    assert_eq!(executor.database().len(), 1);
}

#[test]
fn schema_setting_is_kept_in_config_file() {
    let dir = TempDir::new().unwrap();
    drop(open_strict(dir.path()));

    // Plain open reads thingdb.toml, which still names the schema
    let executor = reopen(&dir);
    let err = executor
        .execute(Command::CreateRecord {
            family: ResourceFamily::Things,
            class: "Undeclared".into(),
            context: String::new(),
            schema: json!({}),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn always_mode_survives_reopen() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path());
    let id = {
        let db = Database::open_with_config(dir.path(), strict_config(DurabilityMode::Always)).unwrap();
        let executor = Executor::new(db);
        create(&executor, ResourceFamily::Things, "TestThing").id
    };
    let executor = reopen(&dir);
    assert_eq!(executor.database().config().durability, DurabilityMode::Always);
    assert!(get(&executor, ResourceFamily::Things, id).is_ok());
}

#[test]
fn torn_tail_is_dropped_on_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let executor = Executor::new(open_strict(dir.path()));
        create(&executor, ResourceFamily::Things, "TestThing").id
    };

    // Half-written length prefix of a following entry
    let log_path = dir.path().join(LOG_FILE_NAME);
    let mut bytes = std::fs::read(&log_path).unwrap();
    bytes.extend_from_slice(&[0x40, 0x00]);
    std::fs::write(&log_path, bytes).unwrap();

    let executor = reopen(&dir);
    assert!(get(&executor, ResourceFamily::Things, id).is_ok());
    // Writable after recovery
    create(&executor, ResourceFamily::Things, "TestThing");
}
