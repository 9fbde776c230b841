//! Composition (`allOf`, `anyOf`, `oneOf`, `not`) and conditional
//! (`if`/`then`/`else`) keywords.
//!
//! Every subschema is validated against the same value through the
//! dispatcher. Only `allOf` and the conditional branches pass sub-errors
//! through; the others report a single error at the current path.

use serde_json::Value;

use super::{validate_schema, Schema, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::logic::RuleError;
use crate::path::{JsonPath, SchemaKeyword};
use crate::validation::ValidationContext;

type Outcome = Result<Vec<SchemaError>, RuleError>;

/// Stops at the first failing subschema and returns its errors.
pub(super) fn validate_all_of(node: &SchemaObject, value: &Value, path: &JsonPath, cx: &ValidationContext<'_>) -> Outcome {
    let Some(schemas) = &node.all_of else {
        return Ok(Vec::new());
    };
    for (i, schema) in schemas.iter().enumerate() {
        let errors = validate_schema(Some(value), schema, &path.push_keyword(SchemaKeyword::AllOf(i)), cx)?;
        if !errors.is_empty() {
            return Ok(errors);
        }
    }
    Ok(Vec::new())
}

pub(super) fn validate_any_of(node: &SchemaObject, value: &Value, path: &JsonPath, cx: &ValidationContext<'_>) -> Outcome {
    let Some(schemas) = &node.any_of else {
        return Ok(Vec::new());
    };
    if schemas.is_empty() {
        return Ok(Vec::new());
    }
    for schema in schemas {
        if validate_schema(Some(value), schema, path, cx)?.is_empty() {
            return Ok(Vec::new());
        }
    }
    Ok(vec![node.violation(
        ErrorKind::AnyOf,
        path,
        value,
        "Must match at least one of the allowed options",
    )])
}

pub(super) fn validate_one_of(node: &SchemaObject, value: &Value, path: &JsonPath, cx: &ValidationContext<'_>) -> Outcome {
    let Some(schemas) = &node.one_of else {
        return Ok(Vec::new());
    };
    if schemas.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = 0usize;
    for schema in schemas {
        if validate_schema(Some(value), schema, path, cx)?.is_empty() {
            matches += 1;
        }
    }
    if matches == 1 {
        return Ok(Vec::new());
    }
    Ok(vec![node.violation(
        ErrorKind::OneOf,
        path,
        value,
        "Must match exactly one of the allowed options",
    )])
}

pub(super) fn validate_not(node: &SchemaObject, value: &Value, path: &JsonPath, cx: &ValidationContext<'_>) -> Outcome {
    let matched = match &node.not {
        None => return Ok(Vec::new()),
        Some(Schema::Bool(accepts)) => *accepts,
        Some(schema) => validate_schema(Some(value), schema, path, cx)?.is_empty(),
    };
    if !matched {
        return Ok(Vec::new());
    }
    Ok(vec![node.violation(ErrorKind::Not, path, value, "The value is not allowed")])
}

/// Probes `if` against the value and validates the selected branch.
pub(super) fn validate_conditional(node: &SchemaObject, value: &Value, path: &JsonPath, cx: &ValidationContext<'_>) -> Outcome {
    let Some(condition) = &node.if_schema else {
        return Ok(Vec::new());
    };

    let holds = validate_schema(Some(value), condition, path, cx)?.is_empty();
    tracing::trace!(path = %path, holds, "evaluated if");

    let (branch, keyword) = if holds {
        (&node.then_schema, SchemaKeyword::Then)
    } else {
        (&node.else_schema, SchemaKeyword::Else)
    };
    match branch {
        Some(schema) => validate_schema(Some(value), schema, &path.push_keyword(keyword), cx),
        None => Ok(Vec::new()),
    }
}
