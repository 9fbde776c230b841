//! The field arena.
//!
//! Fields are stored in a flat `Vec` and addressed by [`FieldId`]. The tree is
//! built once per form; later passes only update fields in place, so ids held
//! by UI code stay valid for the life of the form.

use indexmap::IndexMap;
use serde_json::Value;

use super::FormError;
use crate::schema::{JsonType, Schema, SchemaObject};

/// Keywords that shape validation or structure rather than display.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "required",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "x-jsf-presentation",
    "x-jsf-logic",
    "x-jsf-logic-validations",
    "x-jsf-logic-computedAttrs",
];

/// Stable handle to a field in a [`FieldTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A UI-facing node mirroring one schema property.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub input_type: String,
    pub json_type: Option<JsonType>,
    /// Current required state.
    pub required: bool,
    /// Current visibility.
    pub is_visible: bool,
    /// Display attributes taken from the (computed) schema.
    pub attributes: IndexMap<String, Value>,
    /// Child fields, in schema order.
    pub fields: Vec<FieldId>,
    static_required: bool,
}

impl Field {
    /// Returns whether the parent schema lists this field in `required`.
    pub fn is_statically_required(&self) -> bool {
        self.static_required
    }

    /// Returns a display attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// An arena of fields built from a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTree {
    nodes: Vec<Field>,
    roots: Vec<FieldId>,
}

impl FieldTree {
    /// Builds one field per property of `schema`, recursing into object
    /// properties that declare their own `properties`.
    ///
    /// # Errors
    ///
    /// With `strict_input_type`, returns `FormError::MissingInputType` for the
    /// first field without `x-jsf-presentation.inputType`.
    pub(crate) fn build(schema: &Schema, strict_input_type: bool) -> Result<Self, FormError> {
        let mut tree = FieldTree::default();
        if let Some(root) = schema.as_object() {
            tree.roots = tree.build_level(root, "", strict_input_type)?;
        }
        Ok(tree)
    }

    fn build_level(
        &mut self,
        parent: &SchemaObject,
        prefix: &str,
        strict_input_type: bool,
    ) -> Result<Vec<FieldId>, FormError> {
        let Some(properties) = &parent.properties else {
            return Ok(Vec::new());
        };

        let mut ids = Vec::with_capacity(properties.len());
        for (name, schema) in properties {
            let Some(node) = schema.as_object() else {
                continue;
            };
            let qualified = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };

            let input_type = match node.input_type() {
                Some(input_type) => input_type.to_string(),
                None if strict_input_type => {
                    return Err(FormError::MissingInputType { field: qualified });
                }
                None => fallback_input_type(node).to_string(),
            };

            let children = self.build_level(node, &qualified, strict_input_type)?;
            let required = parent.requires(name);
            let id = FieldId(self.nodes.len());
            self.nodes.push(Field {
                name: name.clone(),
                label: node.title.clone(),
                description: node.description.clone(),
                input_type,
                json_type: node.schema_type.as_ref().and_then(|t| t.primary()),
                required,
                is_visible: true,
                attributes: display_attributes(schema),
                fields: children,
                static_required: required,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Returns the top-level fields.
    pub fn roots(&self) -> &[FieldId] {
        &self.roots
    }

    /// Returns the field with the given id.
    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.nodes.get_mut(id.0)
    }

    /// Finds a field by dotted name (`"address.zip"`).
    pub fn find(&self, path: &str) -> Option<FieldId> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for name in path.split('.') {
            let id = self.child_named(level, name)?;
            level = self.nodes[id.0].fields.as_slice();
            found = Some(id);
        }
        found
    }

    /// Finds a field by dotted name and returns it.
    pub fn field(&self, path: &str) -> Option<&Field> {
        self.find(path).and_then(|id| self.get(id))
    }

    /// Returns the id of the field called `name` among `ids`.
    pub fn child_named(&self, ids: &[FieldId], name: &str) -> Option<FieldId> {
        ids.iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|f| f.name == name))
    }

    /// Returns the number of fields at every level.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the schema declared no fields.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over every field in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Field)> {
        self.nodes.iter().enumerate().map(|(i, f)| (FieldId(i), f))
    }
}

/// Extracts display attributes: the schema's keywords minus the structural
/// ones, with `x-jsf-presentation` entries lifted to the top level.
pub(crate) fn display_attributes(schema: &Schema) -> IndexMap<String, Value> {
    let mut attributes = IndexMap::new();
    let Value::Object(map) = schema.to_value() else {
        return attributes;
    };

    for (key, value) in &map {
        if !STRUCTURAL_KEYWORDS.contains(&key.as_str()) {
            attributes.insert(key.clone(), value.clone());
        }
    }
    if let Some(Value::Object(presentation)) = map.get("x-jsf-presentation") {
        for (key, value) in presentation {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes
}

fn fallback_input_type(node: &SchemaObject) -> &'static str {
    match node.schema_type.as_ref().and_then(|t| t.primary()) {
        Some(JsonType::Number | JsonType::Integer) => "number",
        Some(JsonType::Boolean) => "checkbox",
        Some(JsonType::Object) => "fieldset",
        Some(JsonType::Array) => "group-array",
        _ if node.properties.is_some() => "fieldset",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_value(json!({
            "properties": {
                "name": { "type": "string", "title": "Name", "maxLength": 10 },
                "age": { "type": "integer", "x-jsf-presentation": { "inputType": "slider", "step": 1 } },
                "address": {
                    "type": "object",
                    "properties": { "zip": { "type": "string" } },
                    "required": ["zip"]
                },
                "ignored": true
            },
            "required": ["name"]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_tree() {
        let tree = FieldTree::build(&schema(), false).unwrap();
        assert_eq!(tree.roots().len(), 3);
        assert_eq!(tree.len(), 4);

        let name = tree.field("name").unwrap();
        assert!(name.required && name.is_statically_required());
        assert_eq!(name.label.as_deref(), Some("Name"));
        assert_eq!(name.input_type, "text");
        assert_eq!(name.attribute("maxLength"), Some(&json!(10)));

        let age = tree.field("age").unwrap();
        assert!(!age.required);
        assert_eq!(age.input_type, "slider");
        assert_eq!(age.attribute("step"), Some(&json!(1)));
        assert!(age.attribute("x-jsf-presentation").is_none());

        let address = tree.field("address").unwrap();
        assert_eq!(address.input_type, "fieldset");
        assert_eq!(address.fields.len(), 1);
        assert!(address.attribute("properties").is_none());
        assert!(tree.field("address.zip").unwrap().required);
    }

    #[test]
    fn test_find_unknown() {
        let tree = FieldTree::build(&schema(), false).unwrap();
        assert!(tree.find("nope").is_none());
        assert!(tree.find("name.zip").is_none());
    }

    #[test]
    fn test_strict_input_type() {
        let err = FieldTree::build(&schema(), true).unwrap_err();
        assert!(matches!(err, FormError::MissingInputType { field } if field == "name"));
    }

    #[test]
    fn test_ids_are_stable_indices() {
        let tree = FieldTree::build(&schema(), false).unwrap();
        for (id, field) in tree.iter() {
            assert_eq!(tree.get(id), Some(field));
        }
        assert!(tree.roots().iter().all(|id| id.index() < tree.len()));
    }
}
