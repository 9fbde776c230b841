//! # formschema
//!
//! JSON-Schema driven form validation with conditional field visibility.
//!
//! ## Overview
//!
//! formschema validates a JSON value against a JSON-Schema-like document and
//! reports every violation with a precise path. The same schema drives a tree
//! of form fields whose visibility and required state follow the schema's
//! conditional logic (`if`/`then`/`else`, `allOf`) as values change.
//!
//! Schemas may carry a rule bridge (`x-jsf-logic`): named JSON-logic
//! validations and computations that other parts of the schema reference by
//! name, either to report errors or to compute keyword values such as a
//! dynamic `minimum`.
//!
//! ## Core Types
//!
//! - [`Schema`]: a boolean schema or a [`SchemaObject`] of keywords
//! - [`SchemaError`]: one violation (path, [`ErrorKind`], schema, value, message)
//! - [`SchemaErrors`]: a non-empty collection of violations
//! - [`FormErrors`]: violations folded into a per-field object for UIs
//! - [`Form`]: a field tree kept in sync with a schema
//!
//! ## Example
//!
//! ```rust
//! use formschema::{validate, ErrorKind, Schema, ValidationOptions};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string", "minLength": 2 },
//!         "tags": { "type": "array", "uniqueItems": true }
//!     },
//!     "required": ["name"]
//! }))
//! .unwrap();
//!
//! let output = validate(&json!({ "tags": ["a", "a"] }), &schema, &ValidationOptions::default()).unwrap();
//! let kinds: Vec<ErrorKind> = output.errors.iter().map(|e| e.kind).collect();
//! assert_eq!(kinds, vec![ErrorKind::Required, ErrorKind::UniqueItems]);
//!
//! let nested = output.form_errors.unwrap();
//! assert_eq!(nested.get("name").and_then(|n| n.as_message()), Some("Required field"));
//! ```

pub mod error;
pub mod form;
pub mod logic;
pub mod path;
pub mod schema;
pub mod validation;

pub use error::{ErrorKind, ErrorNode, FormErrors, SchemaError, SchemaErrors};
pub use form::{create_form, Field, FieldId, FieldTree, Form, FormError, FormOptions};
pub use logic::{LogicValue, Operator, OperatorRegistry, RuleContext, RuleError};
pub use path::{JsonPath, PathSegment, SchemaKeyword};
pub use schema::{
    check_format, deep_equal, validate_schema, ComputedValue, JsonType, LogicSection, Presentation,
    Schema, SchemaObject, SchemaParseError, TypeSet, ValidationRule,
};
pub use validation::{
    validate, validate_with_operators, ValidationContext, ValidationOptions, ValidationOutput,
};

/// Type alias for validation results using SchemaErrors
pub type ValidationResult<T> = stillwater::Validation<T, SchemaErrors>;
