//! The rule bridge: named JSON-logic rules referenced from schemas.
//!
//! A schema's `x-jsf-logic` section defines named boolean `validations` and
//! named `computedValues`. Nested schemas refer to them by name:
//!
//! - `x-jsf-logic-validations: ["is_adult"]` reports a `json-logic` error
//!   when the rule evaluates to `false`.
//! - `x-jsf-logic-computedAttrs: {"minimum": "min_age"}` splices the result
//!   of a computation into a copy of the schema before it is validated.
//!
//! Rules always read their variables from the value the section was found on,
//! with `null` leaves replaced by NaN.

mod attrs;
mod eval;
mod operators;
mod value;

use serde_json::{Map, Value};

use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;
use crate::schema::{LogicSection, Schema, SchemaObject};

pub use operators::{Operator, OperatorRegistry};
pub use value::LogicValue;

pub(crate) use eval::Evaluator;

const COMPUTED_ATTRS: &str = "x-jsf-logic-computedAttrs";

/// Errors raised by misconfigured rules.
///
/// These indicate a defect in the schema or in the caller's operator set,
/// never bad input data.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A schema referenced a validation that the logic section does not define.
    #[error("validation '{0}' is not defined in x-jsf-logic")]
    UnknownValidation(String),

    /// A schema referenced a computation that the logic section does not define.
    #[error("computed value '{0}' is not defined in x-jsf-logic")]
    UnknownComputation(String),

    /// A rule used an operator that is neither built in nor registered.
    #[error("unknown rule operator '{0}'")]
    UnknownOperator(String),

    /// Attempted to register an operator under a built-in name.
    #[error("operator '{0}' is built in and cannot be replaced")]
    ReservedOperator(String),

    /// Attempted to register an operator name twice.
    #[error("operator '{0}' already registered")]
    DuplicateOperator(String),

    /// A rule expression has an unusable shape.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// A schema used a named rule with no `x-jsf-logic` section in scope.
    #[error("'{0}' requires an x-jsf-logic section in scope")]
    MissingRuleContext(&'static str),

    /// Splicing computed attributes produced a document that is not a schema.
    #[error("computed attributes produced an invalid schema: {0}")]
    ComputedSchema(#[from] serde_json::Error),
}

/// The named rules in scope and the value they read from.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    logic: &'a LogicSection,
    value: &'a Value,
}

impl<'a> RuleContext<'a> {
    /// Creates a rule context over `logic`, evaluating against `value`.
    pub fn new(logic: &'a LogicSection, value: &'a Value) -> Self {
        Self { logic, value }
    }

    /// Returns the logic section.
    pub fn logic(&self) -> &'a LogicSection {
        self.logic
    }

    /// Returns the value rules read their variables from.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    fn data(&self) -> LogicValue {
        LogicValue::from_form_data(self.value)
    }

    /// Evaluates the named validation rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::UnknownValidation` if no validation is named `name`,
    /// or any evaluation error.
    pub fn validation(&self, name: &str, operators: &OperatorRegistry) -> Result<LogicValue, RuleError> {
        let rule = self
            .logic
            .validations
            .get(name)
            .ok_or_else(|| RuleError::UnknownValidation(name.to_string()))?;
        let result = Evaluator::new(operators).evaluate(&rule.rule, &self.data())?;
        tracing::trace!(rule = name, result = ?result, "evaluated validation");
        Ok(result)
    }

    /// Evaluates the named computation.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::UnknownComputation` if no computation is named
    /// `name`, or any evaluation error.
    pub fn compute(&self, name: &str, operators: &OperatorRegistry) -> Result<LogicValue, RuleError> {
        let computed = self
            .logic
            .computed_values
            .get(name)
            .ok_or_else(|| RuleError::UnknownComputation(name.to_string()))?;
        let result = Evaluator::new(operators).evaluate(&computed.rule, &self.data())?;
        tracing::trace!(computation = name, result = ?result, "evaluated computation");
        Ok(result)
    }

    /// Replaces every `{{name}}` placeholder in `template`.
    ///
    /// A placeholder resolves to the computation of that name, then to the
    /// variable at that dotted path. Anything else is left as written.
    ///
    /// # Errors
    ///
    /// Returns any error raised while evaluating a computation.
    pub fn interpolate(&self, template: &str, operators: &OperatorRegistry) -> Result<String, RuleError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            let raw = &rest[start..start + len + 4];
            let name = rest[start + 2..start + 2 + len].trim();

            if self.logic.computed_values.contains_key(name) {
                out.push_str(&self.compute(name, operators)?.to_js_string());
            } else if let Some(found) = self.data().lookup(name) {
                out.push_str(&found.to_js_string());
            } else {
                out.push_str(raw);
            }
            rest = &rest[start + len + 4..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn resolve_attr(&self, spec: &Value, operators: &OperatorRegistry) -> Result<Value, RuleError> {
        match spec {
            Value::String(template) if template.contains("{{") => {
                Ok(Value::String(self.interpolate(template, operators)?))
            }
            Value::String(name) => Ok(self.compute(name, operators)?.to_json()),
            Value::Object(nested) => {
                let mut out = Map::new();
                for (key, inner) in nested {
                    out.insert(key.clone(), self.resolve_attr(inner, operators)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Writes resolved computed attributes into a schema map, removing the
    /// `x-jsf-logic-computedAttrs` keyword itself. Results that do not fit
    /// their keyword are skipped.
    fn splice(&self, map: &mut Map<String, Value>, operators: &OperatorRegistry) -> Result<(), RuleError> {
        let Some(Value::Object(computed)) = map.shift_remove(COMPUTED_ATTRS) else {
            return Ok(());
        };

        for (key, spec) in &computed {
            let Some(resolved) = attrs::fit_attribute(key, self.resolve_attr(spec, operators)?) else {
                continue;
            };
            if let (Value::Object(update), Some(Value::Object(existing))) =
                (&resolved, map.get_mut(key))
            {
                existing.extend(update.clone());
                continue;
            }
            map.insert(key.clone(), resolved);
        }
        Ok(())
    }

    /// Returns a copy of `node` with its computed attributes applied.
    ///
    /// # Errors
    ///
    /// Returns any rule error, or `RuleError::ComputedSchema` if the result
    /// is not a valid schema.
    pub fn apply_computed_attrs(
        &self,
        node: &SchemaObject,
        operators: &OperatorRegistry,
    ) -> Result<SchemaObject, RuleError> {
        let mut value = serde_json::to_value(node)?;
        if let Value::Object(map) = &mut value {
            self.splice(map, operators)?;
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Returns a copy of `schema` with computed attributes applied at every
    /// level: nested properties, conditional branches, and composition lists.
    ///
    /// # Errors
    ///
    /// See [`apply_computed_attrs`](Self::apply_computed_attrs).
    pub fn apply_computed_attrs_deep(
        &self,
        schema: &Schema,
        operators: &OperatorRegistry,
    ) -> Result<Schema, RuleError> {
        let mut value = schema.to_value();
        self.splice_deep(&mut value, operators)?;
        Ok(serde_json::from_value(value)?)
    }

    fn splice_deep(&self, value: &mut Value, operators: &OperatorRegistry) -> Result<(), RuleError> {
        let Value::Object(map) = value else {
            return Ok(());
        };
        self.splice(map, operators)?;

        if let Some(Value::Object(properties)) = map.get_mut("properties") {
            for property in properties.values_mut() {
                self.splice_deep(property, operators)?;
            }
        }
        for key in ["if", "then", "else", "items", "not"] {
            if let Some(child) = map.get_mut(key) {
                self.splice_deep(child, operators)?;
            }
        }
        for key in ["allOf", "anyOf", "oneOf"] {
            if let Some(Value::Array(list)) = map.get_mut(key) {
                for child in list {
                    self.splice_deep(child, operators)?;
                }
            }
        }
        Ok(())
    }
}

/// Checks the validations listed in `x-jsf-logic-validations` of `node`.
///
/// A rule fails only when it evaluates to exactly `false`.
pub(crate) fn check_named_validations(
    names: &[String],
    node: &SchemaObject,
    value: &Value,
    path: &JsonPath,
    rules: &RuleContext<'_>,
    operators: &OperatorRegistry,
) -> Result<Vec<SchemaError>, RuleError> {
    let mut errors = Vec::new();
    for name in names {
        if rules.validation(name, operators)? != LogicValue::Bool(false) {
            continue;
        }

        let configured = rules
            .logic
            .validations
            .get(name)
            .and_then(|rule| rule.error_message.as_deref());
        let error = match configured {
            Some(template) => {
                let message = rules.interpolate(template, operators)?;
                node.violation(ErrorKind::JsonLogic, path, value, message.clone())
                    .with_custom_message(message)
            }
            None => node.violation(
                ErrorKind::JsonLogic,
                path,
                value,
                format!("Must satisfy the '{}' rule", name),
            ),
        };
        errors.push(error);
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logic(section: Value) -> LogicSection {
        serde_json::from_value(section).unwrap()
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let section = logic(json!({}));
        let value = json!({});
        let rules = RuleContext::new(&section, &value);
        let operators = OperatorRegistry::new();

        assert!(matches!(
            rules.validation("nope", &operators),
            Err(RuleError::UnknownValidation(_))
        ));
        assert!(matches!(
            rules.compute("nope", &operators),
            Err(RuleError::UnknownComputation(_))
        ));
    }

    #[test]
    fn test_interpolation() {
        let section = logic(json!({
            "computedValues": { "double_age": { "rule": { "*": [{ "var": "age" }, 2] } } }
        }));
        let value = json!({ "age": 21, "name": "Ada" });
        let rules = RuleContext::new(&section, &value);
        let operators = OperatorRegistry::new();

        let text = rules
            .interpolate("{{ name }} is {{age}}, twice is {{double_age}} {{unknown}}", &operators)
            .unwrap();
        assert_eq!(text, "Ada is 21, twice is 42 {{unknown}}");
        assert_eq!(rules.interpolate("no braces {{", &operators).unwrap(), "no braces {{");
    }

    #[test]
    fn test_apply_computed_attrs() {
        let section = logic(json!({
            "computedValues": { "min_age": { "rule": { "+": [{ "var": "base" }, 1] } } }
        }));
        let value = json!({ "base": 17 });
        let rules = RuleContext::new(&section, &value);
        let operators = OperatorRegistry::new();

        let node: SchemaObject = serde_json::from_value(json!({
            "type": "integer",
            "x-jsf-errorMessage": { "type": "Numbers only" },
            "x-jsf-logic-computedAttrs": {
                "minimum": "min_age",
                "title": "At least {{min_age}}",
                "x-jsf-errorMessage": { "minimum": "You must be {{min_age}}" }
            }
        }))
        .unwrap();

        let computed = rules.apply_computed_attrs(&node, &operators).unwrap();
        assert_eq!(computed.minimum, Some(serde_json::Number::from(18)));
        assert_eq!(computed.title.as_deref(), Some("At least 18"));
        assert!(computed.computed_attrs.is_none());
        assert_eq!(computed.error_message(ErrorKind::Minimum), Some("You must be 18"));
        assert_eq!(computed.error_message(ErrorKind::Type), Some("Numbers only"));
        assert!(node.computed_attrs.is_some());
    }

    #[test]
    fn test_apply_computed_attrs_deep_reaches_conditionals() {
        let section = logic(json!({
            "computedValues": { "limit": { "rule": { "var": "cap" } } }
        }));
        let value = json!({ "cap": 5 });
        let rules = RuleContext::new(&section, &value);
        let operators = OperatorRegistry::new();

        let schema = Schema::from_value(json!({
            "properties": {
                "a": { "x-jsf-logic-computedAttrs": { "maximum": "limit" } }
            },
            "allOf": [{
                "if": true,
                "then": { "properties": { "b": { "x-jsf-logic-computedAttrs": { "minimum": "limit" } } } }
            }]
        }))
        .unwrap();

        let computed = rules.apply_computed_attrs_deep(&schema, &operators).unwrap();
        assert_eq!(
            computed.to_value(),
            json!({
                "properties": { "a": { "maximum": 5 } },
                "allOf": [{ "if": true, "then": { "properties": { "b": { "minimum": 5 } } } }]
            })
        );
    }

    #[test]
    fn test_named_validation_fails_only_on_false() {
        let section = logic(json!({
            "validations": {
                "adult": { "rule": { ">=": [{ "var": "age" }, 18] }, "errorMessage": "Must be 18, got {{age}}" },
                "non_bool": { "rule": { "var": "age" } }
            }
        }));
        let value = json!({ "age": 12 });
        let rules = RuleContext::new(&section, &value);
        let operators = OperatorRegistry::new();
        let node = SchemaObject::default();

        let errors = check_named_validations(
            &["adult".to_string(), "non_bool".to_string()],
            &node,
            &value,
            &JsonPath::root(),
            &rules,
            &operators,
        )
        .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::JsonLogic);
        assert_eq!(errors[0].display_message(), "Must be 18, got 12");
    }
}
