//! Object keyword checks.
//!
//! `validate_properties` only recurses into property schemas. The dispatcher
//! calls `validate_required` and `validate_additional` itself.

use regex::Regex;
use serde_json::{Map, Value};

use super::{validate_schema, Schema, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::logic::RuleError;
use crate::path::JsonPath;
use crate::validation::{ValidationContext, ValidationOptions};

/// Reports every `required` key missing from `map`.
///
/// A key is missing when absent, when it holds an empty array or an empty
/// object, or when it holds `null` and null is treated as undefined.
pub(super) fn validate_required(
    node: &SchemaObject,
    map: &Map<String, Value>,
    path: &JsonPath,
    options: &ValidationOptions,
) -> Vec<SchemaError> {
    let Some(required) = &node.required else {
        return Vec::new();
    };

    required
        .iter()
        .filter(|key| is_missing(map.get(key.as_str()), options))
        .map(|key| {
            let field_path = path.push_field(key.as_str());
            let value = map.get(key.as_str()).cloned().unwrap_or(Value::Null);
            match node.property(key).and_then(Schema::as_object) {
                Some(property) if property.error_message(ErrorKind::Required).is_some() => {
                    property.violation(ErrorKind::Required, &field_path, &value, "Required field")
                }
                _ => node.violation(ErrorKind::Required, &field_path, &value, "Required field"),
            }
        })
        .collect()
}

fn is_missing(value: Option<&Value>, options: &ValidationOptions) -> bool {
    match value {
        None => true,
        Some(Value::Null) => options.treats_null_as_undefined(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Reports every key that is neither declared nor matched by a pattern,
/// when `additionalProperties` is `false`.
pub(super) fn validate_additional(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    let (Some(Schema::Bool(false)), Some(map)) = (&node.additional_properties, value.as_object()) else {
        return Vec::new();
    };
    let patterns = compile_patterns(node);

    map.iter()
        .filter(|(key, _)| !is_declared(node, key, &patterns))
        .map(|(key, extra)| {
            node.violation(
                ErrorKind::AdditionalProperties,
                &path.push_field(key.as_str()),
                extra,
                format!("Property '{}' is not allowed", key),
            )
        })
        .collect()
}

/// Validates declared, pattern-matched and additional properties.
pub(super) fn validate_properties(
    node: &SchemaObject,
    value: &Value,
    path: &JsonPath,
    cx: &ValidationContext<'_>,
) -> Result<Vec<SchemaError>, RuleError> {
    let Some(map) = value.as_object() else {
        return Ok(Vec::new());
    };

    let mut errors = Vec::new();
    if let Some(properties) = &node.properties {
        for (name, schema) in properties {
            errors.extend(validate_schema(map.get(name), schema, &path.push_field(name.as_str()), cx)?);
        }
    }

    let patterns = compile_patterns(node);
    for (regex, schema) in &patterns {
        for (key, item) in map.iter().filter(|(key, _)| regex.is_match(key)) {
            errors.extend(validate_schema(Some(item), schema, &path.push_field(key.as_str()), cx)?);
        }
    }

    if let Some(schema @ Schema::Keywords(_)) = &node.additional_properties {
        for (key, item) in map.iter().filter(|(key, _)| !is_declared(node, key, &patterns)) {
            errors.extend(validate_schema(Some(item), schema, &path.push_field(key.as_str()), cx)?);
        }
    }

    Ok(errors)
}

fn compile_patterns(node: &SchemaObject) -> Vec<(Regex, &Schema)> {
    let Some(pattern_properties) = &node.pattern_properties else {
        return Vec::new();
    };
    pattern_properties
        .iter()
        .filter_map(|(pattern, schema)| match Regex::new(pattern) {
            Ok(regex) => Some((regex, schema)),
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "ignoring invalid patternProperties key");
                None
            }
        })
        .collect()
}

fn is_declared(node: &SchemaObject, key: &str, patterns: &[(Regex, &Schema)]) -> bool {
    node.property(key).is_some() || patterns.iter().any(|(regex, _)| regex.is_match(key))
}
