//! Forms: a field tree kept in sync with a schema.
//!
//! [`create_form`] parses a schema, builds a [`FieldTree`] with one field per
//! property, and runs the first mutation pass against the initial values.
//! [`Form::handle_validation`] then validates each new value and re-runs the
//! mutation pass, updating fields in place.
//!
//! # Example
//!
//! ```rust
//! use formschema::{create_form, FormOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "properties": {
//!         "has_pet": { "type": "boolean" },
//!         "pet_name": { "type": "string" }
//!     },
//!     "allOf": [{
//!         "if": { "properties": { "has_pet": { "const": true } }, "required": ["has_pet"] },
//!         "then": { "required": ["pet_name"] },
//!         "else": { "properties": { "pet_name": false } }
//!     }]
//! });
//!
//! let form = create_form(&schema, FormOptions::new()).unwrap();
//! assert!(!form.fields().read().field("pet_name").unwrap().is_visible);
//!
//! let output = form.handle_validation(&json!({ "has_pet": true })).unwrap();
//! assert_eq!(output.errors.len(), 1);
//!
//! let fields = form.fields();
//! let fields = fields.read();
//! let pet_name = fields.field("pet_name").unwrap();
//! assert!(pet_name.is_visible && pet_name.required);
//! ```

mod field;
mod mutation;

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::logic::{OperatorRegistry, RuleError};
use crate::schema::{Schema, SchemaObject, SchemaParseError};
use crate::validation::{validate_with_operators, ValidationContext, ValidationOptions, ValidationOutput};

pub use field::{Field, FieldId, FieldTree};

/// Errors raised while building a form.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The schema document could not be parsed.
    #[error(transparent)]
    Schema(#[from] SchemaParseError),

    /// `strict_input_type` is on and a field declares no input type.
    #[error("field '{field}' has no x-jsf-presentation.inputType")]
    MissingInputType { field: String },

    /// A rule in the schema is misconfigured.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Options for [`create_form`].
///
/// # Example
///
/// ```rust
/// use formschema::{FormOptions, OperatorRegistry, ValidationOptions};
/// use serde_json::json;
///
/// let options = FormOptions::new()
///     .initial_values(json!({ "age": 30 }))
///     .validation_options(ValidationOptions::new().treat_null_as_undefined(true))
///     .strict_input_type(false)
///     .custom_operators(OperatorRegistry::new());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    initial_values: Option<Value>,
    validation_options: ValidationOptions,
    strict_input_type: bool,
    custom_operators: OperatorRegistry,
}

impl FormOptions {
    /// Creates default options: no initial values, lenient input types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values the first mutation pass runs against.
    pub fn initial_values(mut self, values: Value) -> Self {
        self.initial_values = Some(values);
        self
    }

    /// Sets the options used by every validation of this form.
    pub fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    /// Requires every field to declare `x-jsf-presentation.inputType`.
    pub fn strict_input_type(mut self, strict: bool) -> Self {
        self.strict_input_type = strict;
        self
    }

    /// Sets the custom rule operators available to this form only.
    pub fn custom_operators(mut self, operators: OperatorRegistry) -> Self {
        self.custom_operators = operators;
        self
    }
}

/// A schema-driven form.
///
/// The field tree is shared through [`fields`](Self::fields); callers may
/// hold the handle across validations and always see current state.
/// Validating from several threads at once is safe but the last pass wins.
#[derive(Debug)]
pub struct Form {
    schema: Schema,
    fields: Arc<RwLock<FieldTree>>,
    options: ValidationOptions,
    operators: OperatorRegistry,
}

/// Builds a form from a schema document.
///
/// # Errors
///
/// Returns [`FormError`] if the schema does not parse, a field lacks an
/// input type under `strict_input_type`, or the first mutation pass hits a
/// rule error.
pub fn create_form(schema: &Value, options: FormOptions) -> Result<Form, FormError> {
    let schema = Schema::from_value(schema.clone())?;
    let tree = FieldTree::build(&schema, options.strict_input_type)?;
    tracing::debug!(fields = tree.len(), "building form");

    let form = Form {
        schema,
        fields: Arc::new(RwLock::new(tree)),
        options: options.validation_options,
        operators: options.custom_operators,
    };

    let initial = options
        .initial_values
        .unwrap_or_else(|| Value::Object(Map::new()));
    form.mutate(&initial)?;
    Ok(form)
}

impl Form {
    /// Returns the schema this form was built from.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns a shared handle to the field tree.
    pub fn fields(&self) -> Arc<RwLock<FieldTree>> {
        Arc::clone(&self.fields)
    }

    /// Returns the operators available to this form's rules.
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Validates `value`, then updates field visibility and attributes.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] if a rule referenced by the schema is misconfigured.
    pub fn handle_validation(&self, value: &Value) -> Result<ValidationOutput, RuleError> {
        let output = validate_with_operators(value, &self.schema, &self.options, &self.operators)?;
        self.mutate(value)?;
        Ok(output)
    }

    fn mutate(&self, value: &Value) -> Result<(), RuleError> {
        let Some(root) = self.schema.as_object() else {
            return Ok(());
        };
        let base = ValidationContext::new(&self.options, &self.operators);

        let Some(logic) = &root.logic else {
            return self.mutate_with(root, value, &base);
        };
        let cx = base.with_rules(logic, value);
        let computed = match cx.rules() {
            Some(rules) => rules.apply_computed_attrs_deep(&self.schema, &self.operators)?,
            None => self.schema.clone(),
        };
        match computed.as_object() {
            Some(node) => self.mutate_with(node, value, &cx),
            None => Ok(()),
        }
    }

    fn mutate_with(
        &self,
        node: &SchemaObject,
        value: &Value,
        cx: &ValidationContext<'_>,
    ) -> Result<(), RuleError> {
        let mut tree = self.fields.write();
        let roots = tree.roots().to_vec();
        tracing::debug!(fields = tree.len(), "mutating fields");
        mutation::mutate_fields(&mut tree, &roots, node, value, cx)
    }
}
