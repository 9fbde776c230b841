//! Number keyword checks.
//!
//! Bounds compare as `f64`. `multipleOf` divides and accepts quotients within
//! a small relative tolerance of an integer, so decimal steps such as `0.01`
//! behave the way form authors expect (`0.3` is a multiple of `0.1`).

use serde_json::{Number, Value};

use super::{format_number, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

const MULTIPLE_TOLERANCE: f64 = 1e-9;

pub(super) fn validate_number(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    let Some(n) = value.as_f64() else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    let mut check = |kind: ErrorKind, bound: &Option<Number>, ok: fn(f64, f64) -> bool, text: &str| {
        if let Some(limit) = bound {
            if let Some(l) = limit.as_f64() {
                if !ok(n, l) {
                    errors.push(node.violation(
                        kind,
                        path,
                        value,
                        format!("{} {}", text, format_number(limit)),
                    ));
                }
            }
        }
    };

    check(ErrorKind::Minimum, &node.minimum, |n, l| n >= l, "Must be greater or equal to");
    check(ErrorKind::Maximum, &node.maximum, |n, l| n <= l, "Must be smaller or equal to");
    check(
        ErrorKind::ExclusiveMinimum,
        &node.exclusive_minimum,
        |n, l| n > l,
        "Must be greater than",
    );
    check(
        ErrorKind::ExclusiveMaximum,
        &node.exclusive_maximum,
        |n, l| n < l,
        "Must be smaller than",
    );

    if let Some(step) = &node.multiple_of {
        if let Some(s) = step.as_f64() {
            if !is_multiple(n, s) {
                errors.push(node.violation(
                    ErrorKind::MultipleOf,
                    path,
                    value,
                    format!("Must be a multiple of {}", format_number(step)),
                ));
            }
        }
    }

    errors
}

fn is_multiple(n: f64, step: f64) -> bool {
    if step == 0.0 {
        return true;
    }
    let quotient = n / step;
    (quotient - quotient.round()).abs() <= MULTIPLE_TOLERANCE * quotient.abs().max(1.0)
}
