//! Cross-reference validation and resolution.

use serde_json::json;

use crate::common::*;

fn resolve(executor: &Executor, id: RecordId, property: &str) -> Result<Record, Error> {
    executor
        .execute(Command::ResolveReference {
            family: ResourceFamily::Things,
            id,
            property: property.to_string(),
        })
        .map(expect_record)
}

#[test]
fn local_reference_resolves_to_target() {
    let (_dir, executor) = strict_executor();
    let action = create(&executor, ResourceFamily::Actions, "TestAction");
    let thing = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testCref": cref_json(action.id, "Action")}),
    );

    let target = resolve(&executor, thing.id, "testCref").unwrap();
    assert_eq!(target.id, action.id);
    assert_eq!(target.kind, RecordKind::Action);
}

#[test]
fn reference_by_class_name_resolves() {
    let (_dir, executor) = strict_executor();
    let target = create(&executor, ResourceFamily::Things, "TestThing");
    let source = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testCref": cref_json(target.id, "TestThing")}),
    );
    assert_eq!(resolve(&executor, source.id, "testCref").unwrap().id, target.id);
}

#[test]
fn unknown_reference_type_is_rejected_on_create() {
    let (_dir, executor) = strict_executor();
    let err = executor
        .execute(Command::CreateRecord {
            family: ResourceFamily::Things,
            class: "TestThing".into(),
            context: String::new(),
            schema: json!({"testCref": cref_json(RecordId::new(), "Bogus")}),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Reference { .. }), "{:?}", err);
    assert_eq!(err.status_code(), 422);
}

#[test]
fn dangling_reference_is_stored_but_fails_to_resolve() {
    let (_dir, executor) = strict_executor();
    let source = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testCref": cref_json(RecordId::new(), "Thing")}),
    );
    let err = resolve(&executor, source.id, "testCref").unwrap_err();
    assert!(matches!(err, Error::Reference { .. }), "{:?}", err);
}

#[test]
fn reference_to_deleted_record_fails_to_resolve() {
    let (_dir, executor) = strict_executor();
    let target = create(&executor, ResourceFamily::Things, "TestThing");
    let source = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testCref": cref_json(target.id, "Thing")}),
    );
    executor
        .execute(Command::DeleteRecord {
            family: ResourceFamily::Things,
            id: target.id,
        })
        .unwrap();

    // The source keeps its reference
    let source_now = get(&executor, ResourceFamily::Things, source.id).unwrap();
    assert!(source_now.schema.contains("testCref"));
    assert!(resolve(&executor, source.id, "testCref").is_err());
}

#[test]
fn kind_mismatch_is_target_not_found() {
    let (_dir, executor) = strict_executor();
    let thing = create(&executor, ResourceFamily::Things, "TestThing");
    // Declared as an Action, but the id names a Thing
    let source = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testCref": cref_json(thing.id, "Action")}),
    );
    let err = resolve(&executor, source.id, "testCref").unwrap_err();
    assert!(matches!(err, Error::Reference { .. }), "{:?}", err);
}

#[test]
fn non_reference_property_cannot_be_resolved() {
    let (_dir, executor) = strict_executor();
    let source = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testString": "plain"}),
    );
    let err = resolve(&executor, source.id, "testString").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "{:?}", err);
    let err = resolve(&executor, source.id, "missing").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "{:?}", err);
}
