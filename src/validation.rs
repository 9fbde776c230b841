//! Validation options, the per-call context, and the public entry points.
//!
//! [`ValidationContext`] is threaded unchanged through every recursive call of
//! the dispatcher. It carries the caller's options, the custom operator
//! registry, and (once a schema with an `x-jsf-logic` section is reached) the
//! rule context that nested schemas resolve named rules against.

use serde_json::Value;
use stillwater::Validation;

use crate::error::{FormErrors, SchemaError, SchemaErrors};
use crate::logic::{OperatorRegistry, RuleContext, RuleError};
use crate::path::JsonPath;
use crate::schema::{validate_schema, LogicSection, Schema};
use crate::ValidationResult;

/// Options controlling validation behavior.
///
/// # Example
///
/// ```rust
/// use formschema::ValidationOptions;
///
/// let options = ValidationOptions::new()
///     .treat_null_as_undefined(true)
///     .allow_forbidden_values(false);
/// assert!(options.treats_null_as_undefined());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    treat_null_as_undefined: bool,
    allow_forbidden_values: bool,
}

impl ValidationOptions {
    /// Creates options with every flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats `null` values like absent ones (no errors, counts as missing for `required`).
    pub fn treat_null_as_undefined(mut self, enabled: bool) -> Self {
        self.treat_null_as_undefined = enabled;
        self
    }

    /// Accepts values that meet a `false` schema instead of reporting `forbidden`.
    pub fn allow_forbidden_values(mut self, enabled: bool) -> Self {
        self.allow_forbidden_values = enabled;
        self
    }

    /// Returns whether `null` is treated as absent.
    pub fn treats_null_as_undefined(&self) -> bool {
        self.treat_null_as_undefined
    }

    /// Returns whether `false` schemas are silently accepted.
    pub fn allows_forbidden_values(&self) -> bool {
        self.allow_forbidden_values
    }
}

/// Context carried through the recursive validation call chain.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    options: &'a ValidationOptions,
    operators: &'a OperatorRegistry,
    rules: Option<RuleContext<'a>>,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context without a rule context.
    pub fn new(options: &'a ValidationOptions, operators: &'a OperatorRegistry) -> Self {
        Self {
            options,
            operators,
            rules: None,
        }
    }

    /// Returns a copy of this context bound to the rules of `logic`.
    ///
    /// `value` is the value named rules read their variables from.
    pub fn with_rules<'b>(&self, logic: &'b LogicSection, value: &'b Value) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        ValidationContext {
            options: self.options,
            operators: self.operators,
            rules: Some(RuleContext::new(logic, value)),
        }
    }

    /// Returns the caller's options.
    pub fn options(&self) -> &'a ValidationOptions {
        self.options
    }

    /// Returns the custom operator registry.
    pub fn operators(&self) -> &'a OperatorRegistry {
        self.operators
    }

    /// Returns the rule context, if one has been established.
    pub fn rules(&self) -> Option<&RuleContext<'a>> {
        self.rules.as_ref()
    }
}

/// The result of validating a value against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutput {
    /// Every violation, in evaluation order, with full paths.
    pub errors: Vec<SchemaError>,
    /// The nested, per-field view of `errors`; `None` when valid.
    pub form_errors: Option<FormErrors>,
}

impl ValidationOutput {
    fn from_errors(errors: Vec<SchemaError>) -> Self {
        let form_errors = FormErrors::from_errors(&errors);
        Self {
            errors,
            form_errors,
        }
    }

    /// Returns true if no violation was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into a `stillwater` validation.
    pub fn into_validation(self) -> ValidationResult<()> {
        match SchemaErrors::try_from_vec(self.errors) {
            Some(errors) => Validation::Failure(errors),
            None => Validation::Success(()),
        }
    }
}

/// Validates `value` against `schema`.
///
/// # Errors
///
/// Returns [`RuleError`] when the schema references a rule, computation, or
/// operator that does not exist. Data problems are never errors here; they
/// are reported in [`ValidationOutput::errors`].
///
/// # Example
///
/// ```rust
/// use formschema::{ErrorKind, Schema, ValidationOptions, validate};
/// use serde_json::json;
///
/// let schema = Schema::from_value(json!({ "minimum": 10 })).unwrap();
/// let output = validate(&json!(5), &schema, &ValidationOptions::default()).unwrap();
///
/// assert_eq!(output.errors.len(), 1);
/// assert_eq!(output.errors[0].kind, ErrorKind::Minimum);
/// assert!(output.errors[0].path.is_root());
/// ```
pub fn validate(
    value: &Value,
    schema: &Schema,
    options: &ValidationOptions,
) -> Result<ValidationOutput, RuleError> {
    validate_with_operators(value, schema, options, &OperatorRegistry::new())
}

/// Validates `value` against `schema`, resolving custom rule operators from `operators`.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_with_operators(
    value: &Value,
    schema: &Schema,
    options: &ValidationOptions,
    operators: &OperatorRegistry,
) -> Result<ValidationOutput, RuleError> {
    let context = ValidationContext::new(options, operators);
    let errors = validate_schema(Some(value), schema, &JsonPath::root(), &context)?;
    Ok(ValidationOutput::from_errors(errors))
}
