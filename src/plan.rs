//! Schema-driven planning.
//!
//! Compares prior state with the proposed configuration attribute by
//! attribute. Enumerations marked `ignore_case` do not diff on case alone,
//! locations are compared after normalization, and single nested blocks are
//! compared by their set hash. A change to any force-new attribute or block
//! requires the resource to be replaced.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::block::hash_string;
use crate::schema::{Attribute, AttributeType, NestedBlock, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Plan the transition from `prior` to `proposed`.
///
/// `prior` is `None` when the resource is being created; a `Null` `proposed`
/// value plans a deletion.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    match prior {
        None => plan_create(schema, proposed),
        Some(prior) if proposed.is_null() => plan_delete(prior),
        Some(prior) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let mut changes = Vec::new();
    for name in sorted_keys(schema) {
        if let Some(value) = proposed.get(&name).filter(|v| !v.is_null()) {
            changes.push(AttributeChange::added(name, value.clone()));
        }
    }
    PlanResult::with_changes(proposed.clone(), changes)
}

fn plan_delete(prior: &Value) -> PlanResult {
    let id = prior.get("id").cloned().unwrap_or(Value::Null);
    PlanResult::with_changes(Value::Null, vec![AttributeChange::removed("id", id)])
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut changes = Vec::new();

    for name in sorted_keys(schema) {
        let before = prior.get(&name).filter(|v| !v.is_null());
        let after = proposed.get(&name).filter(|v| !v.is_null());

        let (unchanged, force_new) = if let Some(attr) = schema.block.attributes.get(&name) {
            if is_computed_only(attr) {
                continue;
            }
            (attribute_equal(attr, before, after), attr.force_new)
        } else if let Some(nested) = schema.block.blocks.get(&name) {
            (
                block_hashes(nested, before) == block_hashes(nested, after),
                nested.force_new,
            )
        } else {
            continue;
        };

        if unchanged {
            continue;
        }
        let change = match (before, after) {
            (None, Some(after)) => AttributeChange::added(name, after.clone()),
            (Some(before), None) => AttributeChange::removed(name, before.clone()),
            (Some(before), Some(after)) => {
                AttributeChange::modified(name, before.clone(), after.clone())
            },
            (None, None) => continue,
        };
        changes.push(change.forcing_replace(force_new));
    }

    if changes.is_empty() {
        return PlanResult::no_change(prior.clone());
    }

    let mut planned = proposed.clone();
    let replacing = changes.iter().any(|c| c.requires_replace);
    if let Value::Object(map) = &mut planned {
        // A replacement gets a fresh identity from the remote API.
        match prior.get("id") {
            Some(id) if !replacing => {
                map.insert("id".to_string(), id.clone());
            },
            _ => {
                map.remove("id");
            },
        }
    }
    PlanResult::with_changes(planned, changes)
}

fn sorted_keys(schema: &Schema) -> BTreeSet<String> {
    schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys())
        .cloned()
        .collect()
}

fn is_computed_only(attr: &Attribute) -> bool {
    attr.flags.computed && !attr.flags.optional && !attr.flags.required
}

fn attribute_equal(attr: &Attribute, before: Option<&Value>, after: Option<&Value>) -> bool {
    match (before, after) {
        (None, None) => true,
        (Some(Value::String(a)), Some(Value::String(b))) => {
            let (a, b) = match attr.state_func {
                Some(func) => (func.apply(a), func.apply(b)),
                None => (a.clone(), b.clone()),
            };
            if attr.ignore_case {
                a.eq_ignore_ascii_case(&b)
            } else {
                a == b
            }
        },
        // An empty map and an absent one are the same thing.
        (Some(v), None) | (None, Some(v)) => {
            matches!(attr.attr_type, AttributeType::Map(_))
                && v.as_object().is_some_and(|m| m.is_empty())
        },
        (Some(a), Some(b)) => a == b,
    }
}

/// Set hashes of the elements of a nested block value.
///
/// Elements are accepted as a list or as a single bare object.
pub fn block_hashes(nested: &NestedBlock, value: Option<&Value>) -> BTreeSet<u64> {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };
    let ignore_case = nested
        .block
        .attributes
        .get(&nested.set_key)
        .is_some_and(|attr| attr.ignore_case);

    items
        .into_iter()
        .filter_map(|item| item.get(&nested.set_key).and_then(Value::as_str))
        .map(|key| {
            if ignore_case {
                hash_string(&key.to_ascii_lowercase())
            } else {
                hash_string(key)
            }
        })
        .collect()
}
