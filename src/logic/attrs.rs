//! Fitting computed attribute values to the keywords they are written into.
//!
//! A computation reads user data, so its result can have any shape. Before a
//! result is spliced into a schema it is coerced to the type its keyword
//! expects, or dropped when no coercion applies.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::{Presentation, Schema, TypeSet};

/// Coerces `value` to the type `keyword` expects.
///
/// Returns `None` when the value cannot be used; the caller then leaves the
/// keyword as the schema declared it.
pub(super) fn fit_attribute(keyword: &str, value: Value) -> Option<Value> {
    let fitted = match keyword {
        "minLength" | "maxLength" | "minItems" | "maxItems" | "minContains" | "maxContains" => count(&value),
        "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" | "multipleOf" => {
            value.is_number().then_some(value)
        }
        "title" | "description" | "pattern" | "format" => stringify(value),
        "uniqueItems" => value.is_boolean().then_some(value),
        "required" | "x-jsf-logic-validations" => match value {
            Value::Array(items) => Some(Value::Array(items.into_iter().filter_map(stringify).collect())),
            _ => None,
        },
        "enum" => value.is_array().then_some(value),
        "type" => parses_as::<TypeSet>(value),
        "items" | "contains" | "not" | "if" | "then" | "else" | "additionalProperties" => {
            parses_as::<Schema>(value)
        }
        "prefixItems" | "allOf" | "anyOf" | "oneOf" => parses_as::<Vec<Schema>>(value),
        "properties" | "patternProperties" => parses_as::<IndexMap<String, Schema>>(value),
        "x-jsf-errorMessage" => match value {
            Value::Object(messages) => Some(Value::Object(
                messages
                    .into_iter()
                    .filter_map(|(kind, message)| Some((kind, stringify(message)?)))
                    .collect(),
            )),
            _ => None,
        },
        "x-jsf-presentation" => match value {
            Value::Object(entries) => {
                let entries: Map<String, Value> = entries
                    .into_iter()
                    .filter_map(|(key, entry)| Some((key.clone(), fit_presentation(&key, entry)?)))
                    .collect();
                parses_as::<Presentation>(Value::Object(entries))
            }
            _ => None,
        },
        _ => Some(value),
    };

    if fitted.is_none() {
        tracing::debug!(keyword, "computed attribute dropped: value does not fit the keyword");
    }
    fitted
}

fn fit_presentation(key: &str, value: Value) -> Option<Value> {
    match key {
        "inputType" | "accept" | "minDate" | "maxDate" => stringify(value),
        "maxFileSize" => value.is_number().then_some(value),
        _ => Some(value),
    }
}

/// A non-negative integral count, from any integral number.
fn count(value: &Value) -> Option<Value> {
    let n = value.as_f64()?;
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then(|| Value::from(n as u64))
}

fn stringify(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(_) => Some(value),
        other => Some(Value::String(other.to_string())),
    }
}

fn parses_as<T: DeserializeOwned>(value: Value) -> Option<Value> {
    serde_json::from_value::<T>(value.clone()).is_ok().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_must_be_whole_and_non_negative() {
        assert_eq!(fit_attribute("minLength", json!(2)), Some(json!(2)));
        assert_eq!(fit_attribute("maxItems", json!(4.0)), Some(json!(4)));
        assert_eq!(fit_attribute("minLength", json!(2.5)), None);
        assert_eq!(fit_attribute("minLength", json!(-1)), None);
        assert_eq!(fit_attribute("maxLength", json!("3")), None);
        assert_eq!(fit_attribute("maxLength", Value::Null), None);
    }

    #[test]
    fn test_bounds_must_be_numbers() {
        assert_eq!(fit_attribute("minimum", json!(2.5)), Some(json!(2.5)));
        assert_eq!(fit_attribute("maximum", Value::Null), None);
        assert_eq!(fit_attribute("maximum", json!("ten")), None);
    }

    #[test]
    fn test_text_keywords_are_stringified() {
        assert_eq!(fit_attribute("title", json!(42)), Some(json!("42")));
        assert_eq!(fit_attribute("description", json!(true)), Some(json!("true")));
        assert_eq!(fit_attribute("title", Value::Null), None);
        assert_eq!(
            fit_attribute("x-jsf-errorMessage", json!({ "minimum": 3, "maximum": null })),
            Some(json!({ "minimum": "3" }))
        );
    }

    #[test]
    fn test_structured_keywords_must_parse() {
        assert_eq!(fit_attribute("type", json!("string")), Some(json!("string")));
        assert_eq!(fit_attribute("type", json!("banana")), None);
        assert_eq!(fit_attribute("items", json!(false)), Some(json!(false)));
        assert_eq!(fit_attribute("items", json!(3)), None);
        assert_eq!(fit_attribute("required", json!(["a", 1])), Some(json!(["a", "1"])));
        assert_eq!(
            fit_attribute("x-jsf-presentation", json!({ "inputType": 5, "maxFileSize": "big" })),
            Some(json!({ "inputType": "5" }))
        );
    }

    #[test]
    fn test_unknown_keywords_pass_through() {
        assert_eq!(fit_attribute("x-custom", json!([1, 2])), Some(json!([1, 2])));
    }
}
