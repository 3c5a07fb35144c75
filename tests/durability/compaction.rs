//! Compaction through the command interface.

use serde_json::json;
use tempfile::TempDir;
use thingdb_durability::LOG_FILE_NAME;

use crate::common::*;

#[test]
fn compact_shrinks_log_and_keeps_state() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join(LOG_FILE_NAME);
    let (survivor, version) = {
        let executor = Executor::new(open_strict(dir.path()));
        let survivor = create(&executor, ResourceFamily::Things, "TestThing");
        for i in 0..20 {
            executor
                .execute(Command::PatchRecord {
                    family: ResourceFamily::Things,
                    id: survivor.id,
                    operations: vec![PatchDocument::add("/schema/testNumber", json!(i as f64))],
                })
                .unwrap();
        }
        let doomed = create(&executor, ResourceFamily::Things, "TestThing");
        executor
            .execute(Command::DeleteRecord {
                family: ResourceFamily::Things,
                id: doomed.id,
            })
            .unwrap();

        let before = std::fs::metadata(&log_path).unwrap().len();
        let output = executor.execute(Command::Compact).unwrap();
        assert_eq!(output, Output::Compacted { records: 1 });
        let after = std::fs::metadata(&log_path).unwrap().len();
        assert!(after < before, "{} >= {}", after, before);

        assert_eq!(executor.execute(Command::Flush).unwrap(), Output::Unit);
        let current = get(&executor, ResourceFamily::Things, survivor.id).unwrap();
        (survivor, current.version)
    };

    let executor = Executor::new(Database::open(dir.path()).unwrap());
    let reopened = get(&executor, ResourceFamily::Things, survivor.id).unwrap();
    assert_eq!(reopened.version, version);
    assert_eq!(reopened.schema.get("testNumber"), Some(&PropertyValue::Number(19.0)));
    assert_eq!(executor.database().len(), 1);
}
