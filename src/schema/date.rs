//! Date bounds from `x-jsf-presentation.minDate` / `maxDate`.
//!
//! Applies only to `format: "date"` strings that parse as `YYYY-MM-DD`.
//! Malformed values are left to the format check.

use chrono::NaiveDate;
use serde_json::Value;

use super::SchemaObject;
use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) fn validate_date(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    if node.format.as_deref() != Some("date") {
        return Vec::new();
    }
    let (Some(text), Some(presentation)) = (value.as_str(), &node.presentation) else {
        return Vec::new();
    };
    let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    if let Some(min) = parse_bound(presentation.min_date.as_deref()) {
        if date < min {
            errors.push(node.violation(
                ErrorKind::MinDate,
                path,
                value,
                format!("The date must be {} or after.", min.format(DATE_FORMAT)),
            ));
        }
    }
    if let Some(max) = parse_bound(presentation.max_date.as_deref()) {
        if date > max {
            errors.push(node.violation(
                ErrorKind::MaxDate,
                path,
                value,
                format!("The date must be {} or before.", max.format(DATE_FORMAT)),
            ));
        }
    }
    errors
}

fn parse_bound(bound: Option<&str>) -> Option<NaiveDate> {
    let bound = bound?;
    match NaiveDate::parse_from_str(bound, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(bound, error = %err, "ignoring unparseable date bound");
            None
        }
    }
}
