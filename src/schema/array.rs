//! Array keyword checks.
//!
//! Item schemas are validated through the dispatcher. `prefixItems` applies
//! positionally and `items` covers only the indices after the prefix.

use serde_json::Value;

use super::{deep_equal, validate_schema, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::logic::RuleError;
use crate::path::{JsonPath, SchemaKeyword};
use crate::validation::ValidationContext;

pub(super) fn validate_array(
    node: &SchemaObject,
    value: &Value,
    path: &JsonPath,
    cx: &ValidationContext<'_>,
) -> Result<Vec<SchemaError>, RuleError> {
    let Some(items) = value.as_array() else {
        return Ok(Vec::new());
    };

    let mut errors = Vec::new();
    let len = items.len() as u64;

    if let Some(min) = node.min_items {
        if len < min {
            errors.push(node.violation(
                ErrorKind::MinItems,
                path,
                value,
                format!("Must have at least {} items", min),
            ));
        }
    }
    if let Some(max) = node.max_items {
        if len > max {
            errors.push(node.violation(
                ErrorKind::MaxItems,
                path,
                value,
                format!("Must have at most {} items", max),
            ));
        }
    }

    if node.unique_items == Some(true) && first_duplicate(items).is_some() {
        errors.push(node.violation(ErrorKind::UniqueItems, path, value, "Items must be unique"));
    }

    if let Some(contains) = &node.contains {
        let contains_path = path.push_keyword(SchemaKeyword::Contains);
        let mut matches = 0u64;
        for (i, item) in items.iter().enumerate() {
            if validate_schema(Some(item), contains, &contains_path.push_index(i), cx)?.is_empty() {
                matches += 1;
            }
        }
        errors.extend(contains_errors(node, value, path, matches));
    }

    let prefix_len = match &node.prefix_items {
        Some(prefix) => {
            let prefix_path = path.push_keyword(SchemaKeyword::PrefixItems);
            for (i, (item, schema)) in items.iter().zip(prefix).enumerate() {
                errors.extend(validate_schema(Some(item), schema, &prefix_path.push_index(i), cx)?);
            }
            prefix.len()
        }
        None => 0,
    };

    if let Some(schema) = &node.items {
        let items_path = path.push_keyword(SchemaKeyword::Items);
        for (i, item) in items.iter().enumerate().skip(prefix_len) {
            errors.extend(validate_schema(Some(item), schema, &items_path.push_index(i), cx)?);
        }
    }

    Ok(errors)
}

/// Returns the indices of the first pair of structurally equal items.
fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, a)| {
        items[i + 1..]
            .iter()
            .position(|b| deep_equal(a, b))
            .map(|offset| (i, i + 1 + offset))
    })
}

fn contains_errors(node: &SchemaObject, value: &Value, path: &JsonPath, matches: u64) -> Vec<SchemaError> {
    if node.min_contains.is_none() && node.max_contains.is_none() {
        if matches == 0 {
            return vec![node.violation(
                ErrorKind::Contains,
                path,
                value,
                "Must contain at least one matching item",
            )];
        }
        return Vec::new();
    }

    let mut errors = Vec::new();
    let min = node.min_contains.unwrap_or(1);
    if matches < min {
        errors.push(node.violation(
            ErrorKind::MinContains,
            path,
            value,
            format!("Must contain at least {} matching items", min),
        ));
    }
    if let Some(max) = node.max_contains {
        if matches > max {
            errors.push(node.violation(
                ErrorKind::MaxContains,
                path,
                value,
                format!("Must contain at most {} matching items", max),
            ));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::OperatorRegistry;
    use crate::validation::ValidationOptions;
    use serde_json::json;

    fn run(schema: Value, value: Value) -> Vec<SchemaError> {
        let node: SchemaObject = serde_json::from_value(schema).unwrap();
        let options = ValidationOptions::default();
        let operators = OperatorRegistry::new();
        let cx = ValidationContext::new(&options, &operators);
        validate_array(&node, &value, &JsonPath::root(), &cx).unwrap()
    }

    fn kinds(schema: Value, value: Value) -> Vec<ErrorKind> {
        run(schema, value).into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_item_counts() {
        assert_eq!(kinds(json!({ "minItems": 2 }), json!([1])), vec![ErrorKind::MinItems]);
        assert_eq!(kinds(json!({ "maxItems": 1 }), json!([1, 2])), vec![ErrorKind::MaxItems]);
        assert!(kinds(json!({ "minItems": 1, "maxItems": 2 }), json!([1, 2])).is_empty());
    }

    #[test]
    fn test_unique_items() {
        assert_eq!(kinds(json!({ "uniqueItems": true }), json!([1, 1, 2])), vec![ErrorKind::UniqueItems]);
        assert!(kinds(json!({ "uniqueItems": true }), json!([false, 0])).is_empty());
        assert!(kinds(json!({ "uniqueItems": true }), json!([1, true])).is_empty());
        assert_eq!(
            kinds(json!({ "uniqueItems": true }), json!([{ "a": 1, "b": 2 }, { "b": 2, "a": 1 }])),
            vec![ErrorKind::UniqueItems]
        );
        assert!(kinds(json!({ "uniqueItems": false }), json!([1, 1])).is_empty());
    }

    #[test]
    fn test_only_first_duplicate_reported() {
        assert_eq!(first_duplicate(&[json!(1), json!(2), json!(2), json!(1)]), Some((0, 3)));
        assert_eq!(kinds(json!({ "uniqueItems": true }), json!([1, 1, 2, 2])).len(), 1);
    }

    #[test]
    fn test_contains_default_requires_one() {
        let schema = json!({ "contains": { "type": "string" } });
        assert!(kinds(schema.clone(), json!([1, "a"])).is_empty());
        assert_eq!(kinds(schema.clone(), json!([1, 2])), vec![ErrorKind::Contains]);
        assert_eq!(kinds(schema, json!([])), vec![ErrorKind::Contains]);
    }

    #[test]
    fn test_min_and_max_contains() {
        let schema = json!({ "contains": { "minimum": 5 }, "minContains": 2, "maxContains": 3 });
        assert_eq!(kinds(schema.clone(), json!([5, 1])), vec![ErrorKind::MinContains]);
        assert!(kinds(schema.clone(), json!([5, 6, 1])).is_empty());
        assert_eq!(kinds(schema, json!([5, 6, 7, 8])), vec![ErrorKind::MaxContains]);

        let zero = json!({ "contains": { "const": "x" }, "minContains": 0 });
        assert!(kinds(zero, json!([])).is_empty());
    }

    #[test]
    fn test_prefix_items_then_items() {
        let schema = json!({
            "prefixItems": [{ "type": "string" }, { "type": "number" }],
            "items": { "type": "boolean" }
        });
        assert!(kinds(schema.clone(), json!(["a", 1, true, false])).is_empty());

        let errors = run(schema, json!([1, 1, "x"]));
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["prefixItems[0]", "items[2]"]);
        assert_eq!(errors[1].path.value_path().to_string(), "[2]");
    }

    #[test]
    fn test_items_paths_nest() {
        let schema = json!({ "items": { "properties": { "name": { "minLength": 2 } } } });
        let errors = run(schema, json!([{ "name": "ok" }, { "name": "x" }]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "items[1].name");
    }
}
