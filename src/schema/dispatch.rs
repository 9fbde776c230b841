//! The recursive validation entry point.

use serde_json::Value;

use super::{array, combinators, constant, date, file, numeric, object, string};
use super::{Schema, SchemaObject};
use crate::error::{ErrorKind, SchemaError};
use crate::logic::{check_named_validations, RuleError};
use crate::path::JsonPath;
use crate::validation::ValidationContext;

/// Validates `value` against `schema` at `path`.
///
/// Every keyword validator is reached through this function. An absent value
/// (`None`, or `null` when null is treated as undefined) produces no errors;
/// presence is the parent's `required` check.
///
/// Keywords run in a fixed order: type (which stops everything else when it
/// fails), `required`, `additionalProperties: false`, then `const`, `enum`,
/// properties, array, string, number, file, `not`, `allOf`, `anyOf`, `oneOf`,
/// `if`/`then`/`else`, date bounds, the conditional schema embedded in
/// `x-jsf-logic`, and finally named rule validations.
///
/// # Errors
///
/// Returns [`RuleError`] for rule misconfiguration. Data problems are
/// returned as `Ok` errors.
///
/// # Example
///
/// ```rust
/// use formschema::{validate_schema, ErrorKind, JsonPath, OperatorRegistry, Schema};
/// use formschema::{ValidationContext, ValidationOptions};
/// use serde_json::json;
///
/// let schema = Schema::from_value(json!({
///     "required": ["a"],
///     "properties": { "a": { "type": "string" } }
/// }))
/// .unwrap();
/// let options = ValidationOptions::default();
/// let operators = OperatorRegistry::new();
/// let cx = ValidationContext::new(&options, &operators);
///
/// let errors = validate_schema(Some(&json!({})), &schema, &JsonPath::root(), &cx).unwrap();
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].kind, ErrorKind::Required);
/// assert_eq!(errors[0].path.to_string(), "a");
/// ```
pub fn validate_schema(
    value: Option<&Value>,
    schema: &Schema,
    path: &JsonPath,
    cx: &ValidationContext<'_>,
) -> Result<Vec<SchemaError>, RuleError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    if value.is_null() && cx.options().treats_null_as_undefined() {
        return Ok(Vec::new());
    }

    match schema {
        Schema::Bool(true) => Ok(Vec::new()),
        Schema::Bool(false) if cx.options().allows_forbidden_values() => Ok(Vec::new()),
        Schema::Bool(false) => Ok(vec![SchemaError::new(
            path.clone(),
            ErrorKind::Forbidden,
            schema.clone(),
            value.clone(),
            "Not allowed",
        )]),
        Schema::Keywords(node) => match (&node.logic, cx.rules()) {
            (Some(logic), None) => {
                let scoped = cx.with_rules(logic, value);
                validate_keywords(value, node, path, &scoped)
            }
            _ => validate_keywords(value, node, path, cx),
        },
    }
}

fn validate_keywords(
    value: &Value,
    node: &SchemaObject,
    path: &JsonPath,
    cx: &ValidationContext<'_>,
) -> Result<Vec<SchemaError>, RuleError> {
    if node.computed_attrs.is_some() {
        let rules = cx
            .rules()
            .ok_or(RuleError::MissingRuleContext("x-jsf-logic-computedAttrs"))?;
        let computed = rules.apply_computed_attrs(node, cx.operators())?;
        return validate_keywords(value, &computed, path, cx);
    }

    if let Some(types) = &node.schema_type {
        if !types.matches(value) {
            return Ok(vec![node.violation(
                ErrorKind::Type,
                path,
                value,
                format!("The value must be of type {}", types),
            )]);
        }
    }

    let mut errors = Vec::new();
    if let Some(map) = value.as_object() {
        errors.extend(object::validate_required(node, map, path, cx.options()));
    }
    errors.extend(object::validate_additional(node, value, path));

    errors.extend(constant::validate_const(node, value, path));
    errors.extend(constant::validate_enum(node, value, path));
    errors.extend(object::validate_properties(node, value, path, cx)?);
    errors.extend(array::validate_array(node, value, path, cx)?);
    errors.extend(string::validate_string(node, value, path));
    errors.extend(numeric::validate_number(node, value, path));
    errors.extend(file::validate_file(node, value, path));
    errors.extend(combinators::validate_not(node, value, path, cx)?);
    errors.extend(combinators::validate_all_of(node, value, path, cx)?);
    errors.extend(combinators::validate_any_of(node, value, path, cx)?);
    errors.extend(combinators::validate_one_of(node, value, path, cx)?);
    errors.extend(combinators::validate_conditional(node, value, path, cx)?);
    errors.extend(date::validate_date(node, value, path));

    if let Some(logic) = &node.logic {
        errors.extend(validate_keywords(value, &logic.schema, path, cx)?);
    }
    errors.extend(validate_rules(node, value, path, cx)?);

    Ok(errors)
}

/// Named validations and rule probes.
fn validate_rules(
    node: &SchemaObject,
    value: &Value,
    path: &JsonPath,
    cx: &ValidationContext<'_>,
) -> Result<Vec<SchemaError>, RuleError> {
    let mut errors = Vec::new();

    if let Some(names) = &node.logic_validations {
        let rules = cx
            .rules()
            .ok_or(RuleError::MissingRuleContext("x-jsf-logic-validations"))?;
        errors.extend(check_named_validations(names, node, value, path, rules, cx.operators())?);
    }

    if let Some(probes) = &node.rule_probes {
        let rules = cx.rules().ok_or(RuleError::MissingRuleContext("validations"))?;
        for (name, schema) in probes {
            let result = rules.validation(name, cx.operators())?.to_json();
            errors.extend(validate_schema(Some(&result), schema, path, cx)?);
        }
    }

    if let Some(probes) = &node.computed_probes {
        let rules = cx.rules().ok_or(RuleError::MissingRuleContext("computedValues"))?;
        for (name, schema) in probes {
            let result = rules.compute(name, cx.operators())?.to_json();
            errors.extend(validate_schema(Some(&result), schema, path, cx)?);
        }
    }

    Ok(errors)
}
