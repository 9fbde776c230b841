//! Re-synchronizing a field tree with a schema and a value.
//!
//! Each pass walks the tree level by level alongside the schema:
//!
//! 1. Every field at the level is reset to its baseline. Fields that some
//!    conditional branch lists in `required` start with
//!    `is_visible = required = statically required`; all other fields start
//!    visible. Display attributes are reset from the property schema. A
//!    branch counts here when it belongs to a conditional of this level, or
//!    when an ancestor's branch reaches this level through `properties`.
//! 2. Each conditional (the level's own `if`, every `allOf` entry with an
//!    `if`, and the same inside `x-jsf-logic`) is probed against the value and
//!    the selected branch is applied. Then the branches that ancestors
//!    selected for this level are applied.
//! 3. The pass descends into the children of visible fields only; hidden
//!    subtrees keep their last state.
//!
//! Fields are never created or removed.

use serde_json::{Map, Value};

use super::field::{display_attributes, FieldTree};
use super::FieldId;
use crate::error::ErrorKind;
use crate::logic::RuleError;
use crate::path::JsonPath;
use crate::schema::{validate_schema, Schema, SchemaObject};
use crate::validation::ValidationContext;

/// A selected branch's schema for a child fieldset, keyed by the fieldset.
type NestedBranch<'s> = (FieldId, &'s SchemaObject);

/// Runs one mutation pass over the fields `ids`, which mirror `node.properties`.
pub(crate) fn mutate_fields(
    tree: &mut FieldTree,
    ids: &[FieldId],
    node: &SchemaObject,
    value: &Value,
    cx: &ValidationContext<'_>,
) -> Result<(), RuleError> {
    mutate_level(tree, ids, node, value, &[], &[], cx)
}

/// `reachable` holds every ancestor branch that targets this level;
/// `selected` is the subset chosen in this pass.
fn mutate_level<'s>(
    tree: &mut FieldTree,
    ids: &[FieldId],
    node: &'s SchemaObject,
    value: &Value,
    reachable: &[&'s SchemaObject],
    selected: &[&'s SchemaObject],
    cx: &ValidationContext<'_>,
) -> Result<(), RuleError> {
    let conditionals = collect_conditionals(node);
    let branches = level_branches(&conditionals, reachable);
    let revealed: Vec<&str> = branches
        .iter()
        .filter_map(|branch| branch.required.as_ref())
        .flatten()
        .map(String::as_str)
        .collect();

    for &id in ids {
        let Some(field) = tree.get_mut(id) else {
            continue;
        };
        let property = node.property(&field.name);
        let baseline = field.is_statically_required();

        if matches!(property, Some(Schema::Bool(false))) {
            field.is_visible = false;
            field.required = false;
        } else if revealed.iter().any(|name| *name == field.name) {
            field.is_visible = baseline;
            field.required = baseline;
        } else {
            field.is_visible = true;
            field.required = baseline;
        }
        if let Some(schema @ Schema::Keywords(_)) = property {
            field.attributes = display_attributes(schema);
        }
    }

    let mut nested = Vec::new();
    for &conditional in &conditionals {
        apply_conditional(tree, ids, conditional, node, value, cx, &mut nested)?;
    }
    for &branch in selected {
        apply_branch(tree, ids, branch, node, value, cx, &mut nested)?;
    }

    let empty = Value::Object(Map::new());
    for &id in ids {
        let Some(field) = tree.get(id) else {
            continue;
        };
        if !field.is_visible || field.fields.is_empty() {
            continue;
        }
        let Some(child_node) = node.property(&field.name).and_then(Schema::as_object) else {
            continue;
        };
        let children = field.fields.clone();
        let child_reachable: Vec<&SchemaObject> = branches
            .iter()
            .filter_map(|&branch| branch.property(&field.name).and_then(Schema::as_object))
            .collect();
        let child_selected: Vec<&SchemaObject> = nested
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, branch)| *branch)
            .collect();
        let child_value = match value.get(&field.name) {
            Some(inner @ Value::Object(_)) => inner,
            _ => &empty,
        };
        mutate_level(tree, &children, child_node, child_value, &child_reachable, &child_selected, cx)?;
    }

    Ok(())
}

/// Returns the conditional schemas declared at this level.
fn collect_conditionals(node: &SchemaObject) -> Vec<&SchemaObject> {
    let mut found = Vec::new();
    push_conditionals(node, &mut found);
    if let Some(logic) = &node.logic {
        push_conditionals(&logic.schema, &mut found);
    }
    found
}

fn push_conditionals<'s>(node: &'s SchemaObject, found: &mut Vec<&'s SchemaObject>) {
    if node.if_schema.is_some() {
        found.push(node);
    }
    if let Some(all_of) = &node.all_of {
        found.extend(
            all_of
                .iter()
                .filter_map(Schema::as_object)
                .filter(|entry| entry.if_schema.is_some()),
        );
    }
}

/// Every branch that may apply at a level: those of its own conditionals and
/// those inherited from ancestors, each with the branches nested inside it.
fn level_branches<'s>(conditionals: &[&'s SchemaObject], inherited: &[&'s SchemaObject]) -> Vec<&'s SchemaObject> {
    let mut found = Vec::new();
    push_branches(conditionals, &mut found);
    for &branch in inherited {
        found.push(branch);
        push_branches(&collect_conditionals(branch), &mut found);
    }
    found
}

fn push_branches<'s>(conditionals: &[&'s SchemaObject], found: &mut Vec<&'s SchemaObject>) {
    for &conditional in conditionals {
        for branch in [&conditional.then_schema, &conditional.else_schema] {
            if let Some(branch) = branch.as_ref().and_then(Schema::as_object) {
                found.push(branch);
                push_branches(&collect_conditionals(branch), found);
            }
        }
    }
}

/// Probes a conditional's `if`.
///
/// A probe that passes still counts as failed when its `then` requires a
/// field whose current value has the wrong type.
fn evaluate_conditional(
    conditional: &SchemaObject,
    node: &SchemaObject,
    value: &Value,
    cx: &ValidationContext<'_>,
) -> Result<bool, RuleError> {
    let Some(condition) = &conditional.if_schema else {
        return Ok(false);
    };
    if !validate_schema(Some(value), condition, &JsonPath::root(), cx)?.is_empty() {
        return Ok(false);
    }

    let required = conditional
        .then_schema
        .as_ref()
        .and_then(Schema::as_object)
        .and_then(|then| then.required.as_ref());
    if let Some(required) = required {
        for name in required {
            let (Some(current), Some(schema)) = (value.get(name), node.property(name)) else {
                continue;
            };
            let errors = validate_schema(Some(current), schema, &JsonPath::from_field(name.as_str()), cx)?;
            if errors.iter().any(|e| e.kind == ErrorKind::Type) {
                tracing::trace!(field = %name, "conditional suppressed by type error");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn apply_conditional<'s>(
    tree: &mut FieldTree,
    ids: &[FieldId],
    conditional: &'s SchemaObject,
    node: &SchemaObject,
    value: &Value,
    cx: &ValidationContext<'_>,
    nested: &mut Vec<NestedBranch<'s>>,
) -> Result<(), RuleError> {
    let matched = evaluate_conditional(conditional, node, value, cx)?;
    let branch = if matched {
        &conditional.then_schema
    } else {
        &conditional.else_schema
    };
    match branch.as_ref().and_then(Schema::as_object) {
        Some(branch) => apply_branch(tree, ids, branch, node, value, cx, nested),
        None => Ok(()),
    }
}

/// Applies a selected branch to the fields `ids`.
///
/// Property schemas aimed at a fieldset's children are pushed onto `nested`
/// and applied once the pass reaches that fieldset, after its reset.
fn apply_branch<'s>(
    tree: &mut FieldTree,
    ids: &[FieldId],
    branch: &'s SchemaObject,
    node: &SchemaObject,
    value: &Value,
    cx: &ValidationContext<'_>,
    nested: &mut Vec<NestedBranch<'s>>,
) -> Result<(), RuleError> {
    if let Some(properties) = &branch.properties {
        for (name, schema) in properties {
            let Some(id) = tree.child_named(ids, name) else {
                continue;
            };
            let Some(field) = tree.get_mut(id) else {
                continue;
            };
            if schema.is_false() {
                field.is_visible = false;
                continue;
            }
            field.is_visible = true;
            if let Some(inner) = schema.as_object() {
                field.attributes.extend(display_attributes(schema));
                nested.push((id, inner));
            }
        }
    }

    if let Some(required) = &branch.required {
        for name in required {
            if let Some(field) = tree.child_named(ids, name).and_then(|id| tree.get_mut(id)) {
                field.is_visible = true;
                field.required = true;
            }
        }
    }

    for conditional in collect_conditionals(branch) {
        apply_conditional(tree, ids, conditional, node, value, cx, nested)?;
    }
    Ok(())
}
