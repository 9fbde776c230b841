//! `const` and `enum` checks.

use serde_json::Value;

use super::{deep_equal, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

pub(super) fn validate_const(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    match &node.const_value {
        Some(expected) if !deep_equal(value, expected) => vec![node.violation(
            ErrorKind::Const,
            path,
            value,
            format!("The only accepted value is {}", expected),
        )],
        _ => Vec::new(),
    }
}

pub(super) fn validate_enum(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    let Some(options) = &node.enum_values else {
        return Vec::new();
    };
    if options.iter().any(|option| deep_equal(value, option)) {
        return Vec::new();
    }

    let listed: Vec<String> = options.iter().map(Value::to_string).collect();
    vec![node.violation(
        ErrorKind::Enum,
        path,
        value,
        format!("The option {} is not valid. Accepted options: {}", value, listed.join(", ")),
    )]
}
