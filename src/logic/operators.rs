//! Custom rule operators.
//!
//! This module provides the [`OperatorRegistry`] type that stores caller
//! supplied operators for rule expressions. A registry is an explicit value
//! handed to one form (or one validation call); there is no global state.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::logic::eval::is_builtin;
use crate::logic::RuleError;

/// A custom operator. It receives its already evaluated arguments.
pub type Operator = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Type alias for the operator storage map.
type OperatorMap = Arc<RwLock<HashMap<String, Operator>>>;

/// A thread-safe registry of named custom operators.
///
/// Cloning a registry is cheap and the clone shares storage with the
/// original, so an operator registered through one handle is visible
/// through every other.
///
/// # Example
///
/// ```rust
/// use formschema::OperatorRegistry;
/// use serde_json::{json, Value};
///
/// let operators = OperatorRegistry::new();
/// operators
///     .register("double", |args: &[Value]| {
///         json!(args.first().and_then(Value::as_f64).unwrap_or(0.0) * 2.0)
///     })
///     .unwrap();
///
/// // Built-in names are reserved
/// assert!(operators.register("+", |_: &[Value]| Value::Null).is_err());
/// ```
pub struct OperatorRegistry {
    operators: OperatorMap,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            operators: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers an operator under `name`.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::ReservedOperator` if `name` is a built-in operator
    /// and `RuleError::DuplicateOperator` if it is already registered.
    pub fn register<F>(&self, name: impl Into<String>, operator: F) -> Result<(), RuleError>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        if is_builtin(&name) {
            return Err(RuleError::ReservedOperator(name));
        }

        let mut operators = self.operators.write();
        if operators.contains_key(&name) {
            return Err(RuleError::DuplicateOperator(name));
        }

        operators.insert(name, Arc::new(operator));
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn with_operator<F>(self, name: impl Into<String>, operator: F) -> Result<Self, RuleError>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.register(name, operator)?;
        Ok(self)
    }

    /// Retrieves an operator by name.
    pub fn get(&self, name: &str) -> Option<Operator> {
        self.operators.read().get(name).cloned()
    }

    /// Returns true if an operator named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.operators.read().contains_key(name)
    }

    /// Returns the number of registered operators.
    pub fn len(&self) -> usize {
        self.operators.read().len()
    }

    /// Returns true if no operator is registered.
    pub fn is_empty(&self) -> bool {
        self.operators.read().is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OperatorRegistry {
    fn clone(&self) -> Self {
        Self {
            operators: Arc::clone(&self.operators),
        }
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operators = self.operators.read();
        let mut names: Vec<&String> = operators.keys().collect();
        names.sort();
        f.debug_struct("OperatorRegistry")
            .field("operators", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_get() {
        let operators = OperatorRegistry::new();
        operators.register("always", |_: &[Value]| json!(true)).unwrap();

        let op = operators.get("always").unwrap();
        assert_eq!(op(&[]), json!(true));
        assert!(operators.get("never").is_none());
        assert_eq!(operators.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let operators = OperatorRegistry::new();
        operators.register("x", |_: &[Value]| Value::Null).unwrap();
        let err = operators.register("x", |_: &[Value]| Value::Null).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateOperator(name) if name == "x"));
    }

    #[test]
    fn test_builtin_names_reserved() {
        let operators = OperatorRegistry::new();
        for name in ["var", "==", "if", "reduce", "substr"] {
            assert!(matches!(
                operators.register(name, |_: &[Value]| Value::Null),
                Err(RuleError::ReservedOperator(_))
            ));
        }
        assert!(operators.is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let operators = OperatorRegistry::new();
        let handle = operators.clone();
        handle.register("shared", |_: &[Value]| json!(1)).unwrap();
        assert!(operators.contains("shared"));
    }

    #[test]
    fn test_debug_lists_names() {
        let operators = OperatorRegistry::new()
            .with_operator("b", |_: &[Value]| Value::Null)
            .unwrap()
            .with_operator("a", |_: &[Value]| Value::Null)
            .unwrap();
        assert_eq!(
            format!("{:?}", operators),
            r#"OperatorRegistry { operators: ["a", "b"] }"#
        );
    }
}
