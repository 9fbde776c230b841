//! Folding flat violation lists into nested, field-shaped error objects.
//!
//! UIs look errors up by field, not by schema path. [`FormErrors`] mirrors the
//! shape of the validated value: object properties become map entries, array
//! items become list slots (`None` for items without errors), and the leaf is
//! the message to show. Schema keyword segments (`allOf[i]`, `then`, `items`,
//! ...) are dropped. When several errors land on the same spot the first one
//! wins.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::path::PathSegment;

/// One node of a nested error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    /// The message for this field.
    Message(String),
    /// Per-item errors of an array field.
    List(Vec<Option<ErrorNode>>),
    /// Errors of an object field's properties.
    Nested(IndexMap<String, ErrorNode>),
}

impl ErrorNode {
    /// Returns the message if this node is a leaf.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorNode::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Returns the child node for an object key or array index.
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        match self {
            ErrorNode::Nested(map) => map.get(key),
            ErrorNode::List(list) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| list.get(i))
                .and_then(Option::as_ref),
            ErrorNode::Message(_) => None,
        }
    }
}

/// Errors keyed by field name. Path-less errors are keyed by `""`.
///
/// # Example
///
/// ```rust
/// use formschema::{Schema, ValidationOptions, validate};
/// use serde_json::json;
///
/// let schema = Schema::from_value(json!({
///     "properties": {
///         "pets": { "items": { "properties": { "name": { "minLength": 2 } } } }
///     }
/// }))
/// .unwrap();
///
/// let value = json!({ "pets": [{ "name": "Rex" }, { "name": "X" }] });
/// let output = validate(&value, &schema, &ValidationOptions::default()).unwrap();
/// let errors = output.form_errors.unwrap();
///
/// assert_eq!(
///     errors.to_value(),
///     json!({ "pets": [null, { "name": "Please insert at least 2 characters" }] })
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(IndexMap<String, ErrorNode>);

impl FormErrors {
    /// Folds a flat error list into a nested error object.
    ///
    /// Returns `None` when there are no errors.
    pub fn from_errors(errors: &[SchemaError]) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }

        let mut root = IndexMap::new();
        for error in errors {
            let path = error.path.value_path();
            let segments: Vec<PathSegment> = path.segments().cloned().collect();
            let message = error.display_message();

            match segments.split_first() {
                None => insert_into_map(&mut root, String::new(), &[], message),
                Some((head, tail)) => {
                    if let Some(key) = segment_key(head) {
                        insert_into_map(&mut root, key, tail, message);
                    }
                }
            }
        }
        Some(Self(root))
    }

    /// Returns the node for a top-level field.
    pub fn get(&self, field: &str) -> Option<&ErrorNode> {
        self.0.get(field)
    }

    /// Follows a sequence of keys (field names or array indices as strings).
    pub fn lookup(&self, keys: &[&str]) -> Option<&ErrorNode> {
        let (first, rest) = keys.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |node, key| node.get(key))
    }

    /// Returns the message of the path-less error, if any.
    pub fn root_message(&self) -> Option<&str> {
        self.0.get("").and_then(ErrorNode::as_message)
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over top-level entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorNode)> {
        self.0.iter()
    }

    /// Converts the error object to JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn segment_key(segment: &PathSegment) -> Option<String> {
    match segment {
        PathSegment::Field(name) => Some(name.clone()),
        PathSegment::Index(i) => Some(i.to_string()),
        PathSegment::Keyword(_) => None,
    }
}

fn insert_into_map(
    map: &mut IndexMap<String, ErrorNode>,
    key: String,
    rest: &[PathSegment],
    message: &str,
) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, new_node(rest, message));
        }
        Some(existing) => place(existing, rest, message),
    }
}

/// Places `message` below an existing node. Shape conflicts keep the existing node.
fn place(node: &mut ErrorNode, rest: &[PathSegment], message: &str) {
    let Some((head, tail)) = rest.split_first() else {
        return;
    };

    match (node, head) {
        (ErrorNode::List(list), PathSegment::Index(i)) => {
            if list.len() <= *i {
                list.resize(*i + 1, None);
            }
            if let Some(slot) = list.get_mut(*i) {
                match slot {
                    Some(existing) => place(existing, tail, message),
                    None => *slot = Some(new_node(tail, message)),
                }
            }
        }
        (ErrorNode::Nested(map), segment) => {
            if let Some(key) = segment_key(segment) {
                insert_into_map(map, key, tail, message);
            }
        }
        _ => {}
    }
}

fn new_node(rest: &[PathSegment], message: &str) -> ErrorNode {
    let mut node = match rest.first() {
        None => return ErrorNode::Message(message.to_string()),
        Some(PathSegment::Index(_)) => ErrorNode::List(Vec::new()),
        Some(_) => ErrorNode::Nested(IndexMap::new()),
    };
    place(&mut node, rest, message);
    node
}
