//! Create, full update, list and delete.

use serde_json::json;

use crate::common::*;

#[test]
fn update_sets_number_string_and_boolean() {
    let (_dir, executor) = strict_executor();
    let action = create(&executor, ResourceFamily::Actions, "TestAction");

    let cases = [
        ("testNumber", json!(41.0), PropertyValue::Number(41.0)),
        ("testString", json!("wibbly wobbly"), PropertyValue::from("wibbly wobbly")),
        ("testBoolean", json!(true), PropertyValue::Boolean(true)),
    ];
    for (name, value, expected) in cases {
        let output = executor
            .execute(Command::UpdateRecord {
                family: ResourceFamily::Actions,
                id: action.id,
                class: "TestAction".into(),
                context: "blurgh".into(),
                schema: json!({ name: value }),
            })
            .unwrap();
        assert_eq!(output.status_code(), 200);

        let fetched = get(&executor, ResourceFamily::Actions, action.id).unwrap();
        assert_eq!(fetched.context, "blurgh");
        assert_eq!(fetched.schema.get(name), Some(&expected), "{}", name);
    }
}

#[test]
fn update_replaces_the_whole_bag() {
    let (_dir, executor) = strict_executor();
    let thing = create_with(
        &executor,
        ResourceFamily::Things,
        "TestThing",
        json!({"testString": "a", "testNumber": 1.0}),
    );

    let updated = expect_record(
        executor
            .execute(Command::UpdateRecord {
                family: ResourceFamily::Things,
                id: thing.id,
                class: "TestThing".into(),
                context: String::new(),
                schema: json!({"testNumber": 2.0}),
            })
            .unwrap(),
    );
    assert!(!updated.schema.contains("testString"));
    assert_eq!(updated.version, thing.version + 1);
    assert_eq!(updated.created_at, thing.created_at);
}

#[test]
fn update_rejects_class_change_and_bad_types() {
    let (_dir, executor) = strict_executor();
    let thing = create(&executor, ResourceFamily::Things, "TestThing");

    let change_class = executor.execute(Command::UpdateRecord {
        family: ResourceFamily::Things,
        id: thing.id,
        class: "OtherThing".into(),
        context: String::new(),
        schema: json!({}),
    });
    assert!(matches!(change_class, Err(Error::Validation { .. })));

    let wrong_type = executor.execute(Command::UpdateRecord {
        family: ResourceFamily::Things,
        id: thing.id,
        class: "TestThing".into(),
        context: String::new(),
        schema: json!({"testNumber": "forty-one"}),
    });
    assert_eq!(wrong_type.unwrap_err().status_code(), 422);

    // Neither attempt touched the record
    assert_eq!(get(&executor, ResourceFamily::Things, thing.id).unwrap(), thing);
}

#[test]
fn create_rejects_class_of_other_kind() {
    let (_dir, executor) = strict_executor();
    let err = executor
        .execute(Command::CreateRecord {
            family: ResourceFamily::Things,
            class: "TestAction".into(),
            context: String::new(),
            schema: json!({}),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn delete_answers_204_then_404() {
    let (_dir, executor) = strict_executor();
    let thing = create(&executor, ResourceFamily::Things, "TestThing");

    let output = executor
        .execute(Command::DeleteRecord {
            family: ResourceFamily::Things,
            id: thing.id,
        })
        .unwrap();
    assert_eq!(output.status_code(), 204);

    assert_eq!(get(&executor, ResourceFamily::Things, thing.id), Err(404));
    let again = executor
        .execute(Command::DeleteRecord {
            family: ResourceFamily::Things,
            id: thing.id,
        })
        .unwrap_err();
    assert_eq!(again.status_code(), 404);
}

#[test]
fn unbacked_families_answer_501() {
    let (_dir, executor) = strict_executor();
    for family in [ResourceFamily::Keys, ResourceFamily::Adapters, ResourceFamily::Commands] {
        let err = executor
            .execute(Command::ListRecords { family })
            .unwrap_err();
        assert_eq!(err.status_code(), 501);
    }
}
