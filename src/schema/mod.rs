//! Schema documents and the validators that walk them.
//!
//! A [`Schema`] is either a boolean (`true` accepts anything, `false` rejects
//! everything) or a [`SchemaObject`] carrying any subset of keywords. Absent
//! keywords impose no constraint; in particular a missing `type` never
//! defaults to `"object"`.
//!
//! Validation always starts at [`validate_schema`], the single recursive
//! entry point. Every keyword validator in the submodules is reached only
//! through it.
//!
//! # Example
//!
//! ```rust
//! use formschema::{Schema, ValidationOptions, validate};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": { "age": { "type": "integer", "minimum": 18 } },
//!     "required": ["age"]
//! }))
//! .unwrap();
//!
//! let output = validate(&json!({ "age": 12 }), &schema, &ValidationOptions::default()).unwrap();
//! assert_eq!(output.errors.len(), 1);
//! ```

mod array;
mod combinators;
mod constant;
mod date;
mod dispatch;
mod equality;
mod file;
mod format;
mod numeric;
mod object;
mod string;

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::{ErrorKind, SchemaError};
use crate::path::JsonPath;

pub use dispatch::validate_schema;
pub use equality::deep_equal;
pub use format::check_format;

/// Errors raised while turning a JSON document into a [`Schema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaParseError {
    /// The document is neither a boolean nor an object.
    #[error("a schema must be a boolean or an object, got {0}")]
    NotASchema(&'static str),

    /// A keyword carried a value of the wrong shape.
    #[error("invalid schema keyword: {0}")]
    Keyword(#[from] serde_json::Error),
}

/// A JSON-Schema-like document or subdocument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Schema {
    /// `true` accepts every value, `false` rejects every value.
    Bool(bool),
    /// A keyed map of keywords.
    Keywords(Box<SchemaObject>),
}

impl Schema {
    /// Parses a schema from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaParseError`] if the value is not a boolean or object,
    /// or if a keyword has the wrong shape (e.g. `"minimum": "ten"`).
    pub fn from_value(value: Value) -> Result<Self, SchemaParseError> {
        match value {
            Value::Bool(b) => Ok(Schema::Bool(b)),
            Value::Object(_) => {
                let object: SchemaObject = serde_json::from_value(value)?;
                Ok(Schema::Keywords(Box::new(object)))
            }
            other => Err(SchemaParseError::NotASchema(value_type_name(&other))),
        }
    }

    /// Serializes this schema back into a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Returns the keyword map, or `None` for boolean schemas.
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Keywords(object) => Some(object),
            Schema::Bool(_) => None,
        }
    }

    /// Returns true for the `false` schema.
    pub fn is_false(&self) -> bool {
        matches!(self, Schema::Bool(false))
    }
}

impl From<SchemaObject> for Schema {
    fn from(object: SchemaObject) -> Self {
        Schema::Keywords(Box::new(object))
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Schema::from_value(value)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Schema::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// The JSON type names accepted by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl JsonType {
    /// Returns true if `value` satisfies this type name.
    ///
    /// Integral numbers satisfy both `number` and `integer`.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Null => value.is_null(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => is_integral(value),
            JsonType::String => value.is_string(),
        }
    }

    /// Returns the keyword spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::String => "string",
        }
    }
}

impl Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a `type` keyword: one name or a list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(JsonType),
    Many(Vec<JsonType>),
}

impl TypeSet {
    /// Returns true if any listed type accepts `value`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeSet::Single(t) => t.matches(value),
            TypeSet::Many(types) => types.iter().any(|t| t.matches(value)),
        }
    }

    /// Returns true if `ty` is one of the listed types.
    pub fn includes(&self, ty: JsonType) -> bool {
        match self {
            TypeSet::Single(t) => *t == ty,
            TypeSet::Many(types) => types.contains(&ty),
        }
    }

    /// Returns the first listed type.
    pub fn primary(&self) -> Option<JsonType> {
        match self {
            TypeSet::Single(t) => Some(*t),
            TypeSet::Many(types) => types.first().copied(),
        }
    }
}

impl Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSet::Single(t) => write!(f, "{}", t),
            TypeSet::Many(types) => {
                let names: Vec<_> = types.iter().map(|t| t.as_str()).collect();
                write!(f, "{}", names.join(" or "))
            }
        }
    }
}

/// Presentation metadata carried under `x-jsf-presentation`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Comma separated list of accepted file extensions (`.pdf,.png`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    /// Maximum size of a single file, in KiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A named boolean rule inside an `x-jsf-logic` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub rule: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A named computation inside an `x-jsf-logic` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedValue {
    pub rule: Value,
}

/// The `x-jsf-logic` rule-bridge section of a schema.
///
/// Besides the named rules it may embed conditional and composition keywords
/// (`allOf`, `if`/`then`/`else`, ...). Those are validated exactly like the
/// same keywords at the top level of the owning schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogicSection {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub validations: IndexMap<String, ValidationRule>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub computed_values: IndexMap<String, ComputedValue>,
    #[serde(flatten)]
    pub schema: SchemaObject,
}

/// A schema node carrying keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_items: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contains: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// `const`; a present `null` is `Some(Value::Null)`.
    #[serde(
        rename = "const",
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub const_value: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Schema>,

    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_schema: Option<Schema>,
    #[serde(rename = "then", skip_serializing_if = "Option::is_none")]
    pub then_schema: Option<Schema>,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_schema: Option<Schema>,

    #[serde(rename = "x-jsf-presentation", skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
    /// Custom messages keyed by error kind name (`"minimum"`, `"required"`, ...).
    #[serde(rename = "x-jsf-errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_messages: Option<IndexMap<String, String>>,
    #[serde(rename = "x-jsf-logic", skip_serializing_if = "Option::is_none")]
    pub logic: Option<Box<LogicSection>>,
    #[serde(rename = "x-jsf-logic-validations", skip_serializing_if = "Option::is_none")]
    pub logic_validations: Option<Vec<String>>,
    #[serde(rename = "x-jsf-logic-computedAttrs", skip_serializing_if = "Option::is_none")]
    pub computed_attrs: Option<IndexMap<String, Value>>,

    /// Rule probes: each named validation's result is checked against the schema.
    #[serde(rename = "validations", skip_serializing_if = "Option::is_none")]
    pub rule_probes: Option<IndexMap<String, Schema>>,
    /// Computation probes: each named computation's result is checked against the schema.
    #[serde(rename = "computedValues", skip_serializing_if = "Option::is_none")]
    pub computed_probes: Option<IndexMap<String, Schema>>,

    /// Every other keyword, kept verbatim.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl SchemaObject {
    /// Returns the custom message configured for `kind`, if any.
    pub fn error_message(&self, kind: ErrorKind) -> Option<&str> {
        self.error_messages
            .as_ref()
            .and_then(|messages| messages.get(kind.as_str()))
            .map(String::as_str)
    }

    /// Returns the presentation input type, if declared.
    pub fn input_type(&self) -> Option<&str> {
        self.presentation
            .as_ref()
            .and_then(|p| p.input_type.as_deref())
    }

    /// Returns true if `name` is listed in `required`.
    pub fn requires(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|required| required.iter().any(|r| r == name))
    }

    /// Returns the declared schema of property `name`.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Builds an error produced at this node, attaching the configured custom message.
    pub(crate) fn violation(
        &self,
        kind: ErrorKind,
        path: &JsonPath,
        value: &Value,
        message: impl Into<String>,
    ) -> SchemaError {
        let error = SchemaError::new(
            path.clone(),
            kind,
            Schema::Keywords(Box::new(self.clone())),
            value.clone(),
            message,
        );
        match self.error_message(kind) {
            Some(custom) => error.with_custom_message(custom),
            None => error,
        }
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)` instead of `None`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Returns true for numbers without a fractional part (`3`, `3.0`).
pub(crate) fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Returns the JSON type name for a value.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Formats a JSON number without a trailing `.0` for integral floats.
pub(crate) fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
