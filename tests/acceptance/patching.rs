//! JSON-patch batches on the property bag.

use serde_json::json;

use crate::common::*;

fn patch(executor: &Executor, id: RecordId, operations: Vec<PatchDocument>) -> Result<Record, Error> {
    executor
        .execute(Command::PatchRecord {
            family: ResourceFamily::Actions,
            id,
            operations,
        })
        .map(expect_record)
}

#[test]
fn patch_adds_a_reference_property() {
    let (_dir, executor) = strict_executor();
    let thing = create(&executor, ResourceFamily::Things, "TestThing");
    let action = create(&executor, ResourceFamily::Actions, "TestAction");

    let patched = patch(
        &executor,
        action.id,
        vec![PatchDocument::add("/schema/testCref", cref_json(thing.id, "Thing"))],
    )
    .unwrap();

    let cref = patched
        .schema
        .get("testCref")
        .and_then(PropertyValue::as_reference)
        .unwrap();
    assert_eq!(cref.target_id, thing.id);
    assert_eq!(cref.location_url, "http://localhost");
    assert_eq!(patched.version, 2);
}

#[test]
fn patch_batch_is_all_or_nothing() {
    let (_dir, executor) = strict_executor();
    let action = create_with(
        &executor,
        ResourceFamily::Actions,
        "TestAction",
        json!({"testNumber": 1.0}),
    );

    let err = patch(
        &executor,
        action.id,
        vec![
            PatchDocument::replace("/schema/testNumber", json!(2.0)),
            PatchDocument::remove("/schema/testString"),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Patch { .. }));

    let current = get(&executor, ResourceFamily::Actions, action.id).unwrap();
    assert_eq!(current, action);
}

#[test]
fn patch_rejects_unsupported_operations_and_paths() {
    let (_dir, executor) = strict_executor();
    let action = create(&executor, ResourceFamily::Actions, "TestAction");

    let unsupported_op: PatchDocument = serde_json::from_value(
        json!({"op": "move", "from": "/schema/testString", "path": "/schema/testNumber"}),
    )
    .unwrap();
    let err = patch(&executor, action.id, vec![unsupported_op]).unwrap_err();
    assert_eq!(err.status_code(), 422);

    let err = patch(
        &executor,
        action.id,
        vec![PatchDocument::add("/@context", json!("nope"))],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Patch { .. }));
}

#[test]
fn patch_nested_reference_field() {
    let (_dir, executor) = strict_executor();
    let first = create(&executor, ResourceFamily::Things, "TestThing");
    let second = create(&executor, ResourceFamily::Things, "TestThing");
    let action = create_with(
        &executor,
        ResourceFamily::Actions,
        "TestAction",
        json!({"testCref": cref_json(first.id, "Thing")}),
    );

    let patched = patch(
        &executor,
        action.id,
        vec![PatchDocument::replace(
            "/schema/testCref/$cref",
            json!(second.id.to_string()),
        )],
    )
    .unwrap();
    let cref = patched
        .schema
        .get("testCref")
        .and_then(PropertyValue::as_reference)
        .unwrap();
    assert_eq!(cref.target_id, second.id);
}

#[test]
fn empty_patch_leaves_version_alone() {
    let (_dir, executor) = strict_executor();
    let action = create(&executor, ResourceFamily::Actions, "TestAction");
    let same = patch(&executor, action.id, vec![]).unwrap();
    assert_eq!(same.version, action.version);
}
