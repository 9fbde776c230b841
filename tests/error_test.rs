//! Integration tests for flat and nested error reporting.

use formschema::{
    validate, ErrorKind, ErrorNode, JsonPath, Schema, SchemaError, SchemaErrors, ValidationOptions,
    ValidationResult,
};
use serde_json::json;
use stillwater::prelude::*;
use stillwater::Validation;

fn error(field: &str, kind: ErrorKind, message: &str) -> SchemaError {
    SchemaError::new(JsonPath::from_field(field), kind, Schema::Bool(true), json!(null), message)
}

#[test]
fn test_schema_error_display() {
    let err = error("email", ErrorKind::Format, "Please enter a valid email format");
    assert_eq!(err.to_string(), "email: Please enter a valid email format [format]");

    let root = SchemaError::new(JsonPath::root(), ErrorKind::Not, Schema::Bool(true), json!(1), "The value is not allowed");
    assert_eq!(root.to_string(), "(root): The value is not allowed [not]");
}

#[test]
fn test_errors_combine_via_semigroup() {
    let combined = SchemaErrors::single(error("name", ErrorKind::Required, "Required field"))
        .combine(SchemaErrors::single(error("email", ErrorKind::Format, "bad")))
        .combine(SchemaErrors::single(error("name", ErrorKind::MinLength, "short")));

    assert_eq!(combined.len(), 3);
    assert!(!combined.is_empty());
    assert_eq!(combined.first().kind, ErrorKind::Required);
    assert_eq!(combined.at_path(&JsonPath::from_field("name")).len(), 2);
    assert_eq!(combined.of_kind(ErrorKind::Format).len(), 1);
}

#[test]
fn test_try_from_vec() {
    assert!(SchemaErrors::try_from_vec(Vec::new()).is_none());
    let errors = SchemaErrors::try_from_vec(vec![error("a", ErrorKind::Required, "x")]).unwrap();
    assert_eq!(errors.into_vec().len(), 1);
}

#[test]
fn test_errors_from_non_empty_vec() {
    let list = NonEmptyVec::new(
        error("name", ErrorKind::Required, "Required field"),
        vec![error("age", ErrorKind::Minimum, "Must be greater or equal to 0")],
    );
    let errors = SchemaErrors::from_non_empty(list);

    assert_eq!(errors.len(), 2);
    assert_eq!(errors.first().path.to_string(), "name");
    let inner = errors.as_non_empty_vec();
    assert_eq!(inner.head().kind, ErrorKind::Required);
    assert_eq!(inner.tail()[0].path.to_string(), "age");
}

#[test]
fn test_output_into_validation() {
    let schema = Schema::from_value(json!({ "type": "object", "required": ["a", "b"] })).unwrap();

    let failed = validate(&json!({}), &schema, &ValidationOptions::default()).unwrap();
    let result: ValidationResult<()> = failed.into_validation();
    match result {
        Validation::Failure(errors) => assert_eq!(errors.len(), 2),
        Validation::Success(_) => panic!("expected failure"),
    }

    let passed = validate(&json!({ "a": 1, "b": 2 }), &schema, &ValidationOptions::default()).unwrap();
    assert!(passed.form_errors.is_none());
    assert!(passed.into_validation().is_success());
}

#[test]
fn test_nested_error_object() {
    let schema = Schema::from_value(json!({
        "properties": {
            "name": { "minLength": 2 },
            "address": {
                "properties": { "zip": { "pattern": "^[0-9]{5}$" } },
                "required": ["city"]
            },
            "pets": { "items": { "properties": { "age": { "minimum": 0 } } } }
        },
        "not": { "required": ["banned"] }
    }))
    .unwrap();

    let value = json!({
        "name": "A",
        "address": { "zip": "abc" },
        "pets": [{ "age": 1 }, { "age": -1 }],
        "banned": true
    });
    let output = validate(&value, &schema, &ValidationOptions::default()).unwrap();
    let nested = output.form_errors.unwrap();

    assert_eq!(
        nested.to_value(),
        json!({
            "name": "Please insert at least 2 characters",
            "address": { "city": "Required field", "zip": "Must have a valid format" },
            "pets": [null, { "age": "Must be greater or equal to 0" }],
            "": "The value is not allowed"
        })
    );
    assert_eq!(nested.root_message(), Some("The value is not allowed"));
    assert_eq!(
        nested.lookup(&["pets", "1", "age"]).and_then(ErrorNode::as_message),
        Some("Must be greater or equal to 0")
    );
    assert!(nested.lookup(&["pets", "0"]).is_none());
}

#[test]
fn test_first_message_wins_per_field() {
    let schema = Schema::from_value(json!({
        "properties": { "code": { "minLength": 4, "pattern": "^[0-9]+$" } }
    }))
    .unwrap();

    let output = validate(&json!({ "code": "ab" }), &schema, &ValidationOptions::default()).unwrap();
    assert_eq!(output.errors.len(), 2);
    let nested = output.form_errors.unwrap();
    assert_eq!(nested.get("code").and_then(ErrorNode::as_message), Some("Please insert at least 4 characters"));
}

#[test]
fn test_keyword_segments_dropped_from_nested_errors() {
    let schema = Schema::from_value(json!({
        "allOf": [{ "properties": { "age": { "minimum": 18 } } }]
    }))
    .unwrap();

    let output = validate(&json!({ "age": 3 }), &schema, &ValidationOptions::default()).unwrap();
    assert_eq!(output.errors[0].path.to_string(), "allOf[0].age");
    assert_eq!(output.form_errors.unwrap().to_value(), json!({ "age": "Must be greater or equal to 18" }));
}
