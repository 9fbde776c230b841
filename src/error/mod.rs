//! Error types for validation failures.
//!
//! This module provides the flat error model ([`SchemaError`], [`SchemaErrors`])
//! and the nested, UI-facing [`FormErrors`] object derived from it.

mod form_errors;
mod schema_error;

pub use form_errors::{ErrorNode, FormErrors};
pub use schema_error::{ErrorKind, SchemaError, SchemaErrors};
