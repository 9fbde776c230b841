//! Schema validation error types.
//!
//! This module provides [`SchemaError`] for single violations, [`ErrorKind`]
//! for the fixed violation taxonomy, and [`SchemaErrors`] for accumulating
//! multiple errors.

use std::fmt::{self, Display};

use serde_json::Value;
use stillwater::prelude::*;

use crate::path::JsonPath;
use crate::schema::Schema;

/// The kind of rule a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Required,
    AdditionalProperties,
    Const,
    Enum,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinLength,
    MaxLength,
    Pattern,
    Format,
    MinItems,
    MaxItems,
    UniqueItems,
    Contains,
    MinContains,
    MaxContains,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    /// The value met a `false` schema.
    Forbidden,
    FileStructure,
    MaxFileSize,
    Accept,
    MinDate,
    MaxDate,
    /// A named rule-bridge validation evaluated to `false`.
    JsonLogic,
}

impl ErrorKind {
    /// Returns the keyword spelling of this kind, as used in `x-jsf-errorMessage`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Type => "type",
            ErrorKind::Required => "required",
            ErrorKind::AdditionalProperties => "additionalProperties",
            ErrorKind::Const => "const",
            ErrorKind::Enum => "enum",
            ErrorKind::Minimum => "minimum",
            ErrorKind::Maximum => "maximum",
            ErrorKind::ExclusiveMinimum => "exclusiveMinimum",
            ErrorKind::ExclusiveMaximum => "exclusiveMaximum",
            ErrorKind::MultipleOf => "multipleOf",
            ErrorKind::MinLength => "minLength",
            ErrorKind::MaxLength => "maxLength",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Format => "format",
            ErrorKind::MinItems => "minItems",
            ErrorKind::MaxItems => "maxItems",
            ErrorKind::UniqueItems => "uniqueItems",
            ErrorKind::Contains => "contains",
            ErrorKind::MinContains => "minContains",
            ErrorKind::MaxContains => "maxContains",
            ErrorKind::AllOf => "allOf",
            ErrorKind::AnyOf => "anyOf",
            ErrorKind::OneOf => "oneOf",
            ErrorKind::Not => "not",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::FileStructure => "fileStructure",
            ErrorKind::MaxFileSize => "maxFileSize",
            ErrorKind::Accept => "accept",
            ErrorKind::MinDate => "minDate",
            ErrorKind::MaxDate => "maxDate",
            ErrorKind::JsonLogic => "json-logic",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation error with full context.
///
/// - **path**: where the error occurred, including schema keyword segments
/// - **kind**: which rule was violated
/// - **schema**: the subschema that produced the error
/// - **value**: the offending value
/// - **message**: default human-readable description
/// - **custom_message**: message configured through `x-jsf-errorMessage` or a rule
///
/// # Example
///
/// ```rust
/// use formschema::{ErrorKind, JsonPath, Schema, SchemaError};
/// use serde_json::json;
///
/// let error = SchemaError::new(
///     JsonPath::root().push_field("age"),
///     ErrorKind::Minimum,
///     Schema::Bool(true),
///     json!(3),
///     "Must be greater or equal to 18",
/// )
/// .with_custom_message("Adults only");
///
/// assert_eq!(error.display_message(), "Adults only");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// The path to the value that failed validation.
    pub path: JsonPath,
    /// The violated rule.
    pub kind: ErrorKind,
    /// The subschema that produced this error.
    pub schema: Schema,
    /// The value that failed validation.
    pub value: Value,
    /// Default human-readable error message.
    pub message: String,
    /// Message supplied by the schema author, preferred over `message` when shown.
    pub custom_message: Option<String>,
}

impl SchemaError {
    /// Creates a new schema error.
    pub fn new(
        path: JsonPath,
        kind: ErrorKind,
        schema: Schema,
        value: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind,
            schema,
            value,
            message: message.into(),
            custom_message: None,
        }
    }

    /// Sets the custom message and returns self for chaining.
    pub fn with_custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }

    /// Returns the custom message if set, otherwise the default one.
    pub fn display_message(&self) -> &str {
        self.custom_message.as_deref().unwrap_or(&self.message)
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path_str = if self.path.is_root() {
            "(root)".to_string()
        } else {
            self.path.to_string()
        };

        write!(f, "{}: {} [{}]", path_str, self.display_message(), self.kind)
    }
}

impl std::error::Error for SchemaError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaError>();
    assert_sync::<SchemaError>();
};

/// A non-empty collection of schema validation errors.
///
/// `SchemaErrors` wraps a `NonEmptyVec<SchemaError>` so that a
/// `Validation<T, SchemaErrors>` failure always carries at least one error.
///
/// # Combining Errors
///
/// ```rust
/// use formschema::{ErrorKind, JsonPath, Schema, SchemaError, SchemaErrors};
/// use serde_json::json;
/// use stillwater::prelude::*;
///
/// let required = SchemaErrors::single(SchemaError::new(
///     JsonPath::root().push_field("name"),
///     ErrorKind::Required,
///     Schema::Bool(true),
///     json!(null),
///     "Required field",
/// ));
/// let format = SchemaErrors::single(SchemaError::new(
///     JsonPath::root().push_field("email"),
///     ErrorKind::Format,
///     Schema::Bool(true),
///     json!("nope"),
///     "Please enter a valid email format",
/// ));
///
/// let combined = required.combine(format);
/// assert_eq!(combined.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaErrors(NonEmptyVec<SchemaError>);

impl SchemaErrors {
    /// Creates a `SchemaErrors` containing a single error.
    pub fn single(error: SchemaError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Creates a `SchemaErrors` from a `NonEmptyVec` of errors.
    pub fn from_non_empty(errors: NonEmptyVec<SchemaError>) -> Self {
        Self(errors)
    }

    /// Collects a list of errors, returning `None` when the list is empty.
    pub fn try_from_vec(errors: Vec<SchemaError>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::single(first), |acc, error| {
            acc.combine(Self::single(error))
        }))
    }

    /// Returns the number of errors in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    /// Returns all errors at the specified path.
    pub fn at_path(&self, path: &JsonPath) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| &e.path == path).collect()
    }

    /// Returns all errors of the specified kind.
    pub fn of_kind(&self, kind: ErrorKind) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| e.kind == kind).collect()
    }

    /// Returns the first error in the collection.
    pub fn first(&self) -> &SchemaError {
        self.0.head()
    }

    /// Converts this collection into a `Vec<SchemaError>`.
    pub fn into_vec(self) -> Vec<SchemaError> {
        self.0.into_vec()
    }

    /// Returns a reference to the underlying `NonEmptyVec`.
    pub fn as_non_empty_vec(&self) -> &NonEmptyVec<SchemaError> {
        &self.0
    }
}

impl Semigroup for SchemaErrors {
    fn combine(self, other: Self) -> Self {
        SchemaErrors(self.0.combine(other.0))
    }
}

impl Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

impl IntoIterator for SchemaErrors {
    type Item = SchemaError;
    type IntoIter = std::vec::IntoIter<SchemaError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}
