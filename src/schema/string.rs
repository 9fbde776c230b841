//! String keyword checks.
//!
//! Lengths are counted in extended grapheme clusters, so an emoji built from
//! several code points counts as one character. `pattern` is matched against
//! the raw string.

use regex::Regex;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use super::{check_format, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

pub(super) fn validate_string(node: &SchemaObject, value: &Value, path: &JsonPath) -> Vec<SchemaError> {
    let Some(text) = value.as_str() else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    let needs_length = node.min_length.is_some() || node.max_length.is_some();
    let length = if needs_length {
        text.graphemes(true).count() as u64
    } else {
        0
    };

    if let Some(min) = node.min_length {
        if length < min {
            errors.push(node.violation(
                ErrorKind::MinLength,
                path,
                value,
                format!("Please insert at least {} characters", min),
            ));
        }
    }

    if let Some(max) = node.max_length {
        if length > max {
            errors.push(node.violation(
                ErrorKind::MaxLength,
                path,
                value,
                format!("Please insert up to {} characters", max),
            ));
        }
    }

    if let Some(pattern) = &node.pattern {
        match Regex::new(pattern) {
            Ok(regex) if !regex.is_match(text) => {
                errors.push(node.violation(
                    ErrorKind::Pattern,
                    path,
                    value,
                    "Must have a valid format",
                ));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "ignoring invalid pattern");
            }
        }
    }

    if let Some(format) = &node.format {
        if !check_format(format, text) {
            errors.push(node.violation(
                ErrorKind::Format,
                path,
                value,
                format!("Please enter a valid {} format", format),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(schema: Value, value: Value) -> Vec<ErrorKind> {
        let node: SchemaObject = serde_json::from_value(schema).unwrap();
        validate_string(&node, &value, &JsonPath::root())
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_length_counts_graphemes() {
        // family emoji: several code points joined by zero-width joiners
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        assert!(check(json!({ "maxLength": 1 }), json!(family)).is_empty());
        assert!(check(json!({ "minLength": 2 }), json!("e\u{301}x")).is_empty());
        assert_eq!(check(json!({ "minLength": 3 }), json!("e\u{301}x")), vec![ErrorKind::MinLength]);
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(check(json!({ "minLength": 2 }), json!("a")), vec![ErrorKind::MinLength]);
        assert_eq!(check(json!({ "maxLength": 2 }), json!("abc")), vec![ErrorKind::MaxLength]);
        assert!(check(json!({ "minLength": 1, "maxLength": 3 }), json!("abc")).is_empty());
    }

    #[test]
    fn test_pattern() {
        assert!(check(json!({ "pattern": "^[a-z]+$" }), json!("abc")).is_empty());
        assert_eq!(check(json!({ "pattern": "^[a-z]+$" }), json!("aBc")), vec![ErrorKind::Pattern]);
        // unanchored patterns match anywhere
        assert!(check(json!({ "pattern": "\\d" }), json!("a1b")).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        assert!(check(json!({ "pattern": "(unclosed" }), json!("abc")).is_empty());
    }

    #[test]
    fn test_format() {
        assert_eq!(check(json!({ "format": "email" }), json!("nope")), vec![ErrorKind::Format]);
        assert!(check(json!({ "format": "email" }), json!("a@b.io")).is_empty());
        assert!(check(json!({ "format": "unknown" }), json!("x")).is_empty());
    }

    #[test]
    fn test_accumulates_independent_errors() {
        let kinds = check(json!({ "minLength": 5, "pattern": "^\\d+$" }), json!("ab"));
        assert_eq!(kinds, vec![ErrorKind::MinLength, ErrorKind::Pattern]);
    }
}
