//! Concurrent mutations through a shared executor.

use std::sync::{Arc, Barrier};
use std::thread;

use serde_json::json;

use crate::common::*;

#[test]
fn concurrent_patches_on_one_record_are_serialized() {
    let (_dir, executor) = strict_executor();
    let executor = Arc::new(executor);
    let action = create_with(
        &executor,
        ResourceFamily::Actions,
        "TestAction",
        json!({"testNumber": 0.0}),
    );

    const THREADS: usize = 8;
    const PATCHES: usize = 25;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PATCHES {
                    executor
                        .execute(Command::PatchRecord {
                            family: ResourceFamily::Actions,
                            id: action.id,
                            operations: vec![PatchDocument::replace(
                                "/schema/testNumber",
                                json!((t * PATCHES + i) as f64),
                            )],
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let final_record = get(&executor, ResourceFamily::Actions, action.id).unwrap();
    assert_eq!(final_record.version, 1 + (THREADS * PATCHES) as u64);
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    let (_dir, executor) = strict_executor();
    let executor = Arc::new(executor);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let executor = Arc::clone(&executor);
            thread::spawn(move || {
                (0..50)
                    .map(|_| create(&executor, ResourceFamily::Things, "TestThing").id)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<RecordId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 200);

    match executor
        .execute(Command::ListRecords {
            family: ResourceFamily::Things,
        })
        .unwrap()
    {
        Output::Records(records) => assert_eq!(records.len(), 200),
        other => panic!("Expected Records output, got {:?}", other),
    }
}

#[test]
fn delete_racing_patches_leaves_record_gone() {
    let (_dir, executor) = strict_executor();
    let executor = Arc::new(executor);
    let thing = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testNumber": 0.0}),
    );
    let barrier = Arc::new(Barrier::new(2));

    let patcher = {
        let executor = Arc::clone(&executor);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..100 {
                let result = executor.execute(Command::PatchRecord {
                    family: ResourceFamily::Things,
                    id: thing.id,
                    operations: vec![PatchDocument::replace("/schema/testNumber", json!(i as f64))],
                });
                if let Err(e) = result {
                    assert_eq!(e.status_code(), 404);
                }
            }
        })
    };

    barrier.wait();
    executor
        .execute(Command::DeleteRecord {
            family: ResourceFamily::Things,
            id: thing.id,
        })
        .unwrap();
    patcher.join().unwrap();

    assert_eq!(get(&executor, ResourceFamily::Things, thing.id), Err(404));
}

#[test]
fn concurrent_updates_on_distinct_records_stay_independent() {
    let (_dir, executor) = strict_executor();
    let executor = Arc::new(executor);
    let things: Vec<Record> = (0..2)
        .map(|_| create(&executor, ResourceFamily::Things, "TestThing"))
        .collect();
    let before = executor.database().lock_stats();

    const UPDATES: usize = 50;
    let barrier = Arc::new(Barrier::new(things.len()));

    let handles: Vec<_> = things
        .iter()
        .enumerate()
        .map(|(t, thing)| {
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            let id = thing.id;
            thread::spawn(move || {
                barrier.wait();
                for i in 0..UPDATES {
                    let updated = expect_record(
                        executor
                            .execute(Command::UpdateRecord {
                                family: ResourceFamily::Things,
                                id,
                                class: "TestThing".into(),
                                context: format!("ctx-{}", t),
                                schema: json!({
                                    "testNumber": (t * 1000 + i) as f64,
                                    "testString": format!("thread-{}", t),
                                }),
                            })
                            .unwrap(),
                    );
                    assert_eq!(updated.version, 2 + i as u64);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (t, thing) in things.iter().enumerate() {
        let stored = get(&executor, ResourceFamily::Things, thing.id).unwrap();
        assert_eq!(stored.version, 1 + UPDATES as u64);
        assert_eq!(stored.context, format!("ctx-{}", t));
        assert_eq!(
            stored.schema.get("testNumber"),
            Some(&PropertyValue::Number((t * 1000 + UPDATES - 1) as f64))
        );
        assert_eq!(
            stored.schema.get("testString"),
            Some(&PropertyValue::from(format!("thread-{}", t)))
        );
    }

    let after = executor.database().lock_stats();
    assert_eq!(after.contended, before.contended);
    assert_eq!(after.contended, 0);
    assert!(after.acquisitions >= before.acquisitions + 2 * UPDATES as u64);
}
