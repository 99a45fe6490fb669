//! Change-sets: the wire record of one attribute mutation.

use crate::error::ModelResult;
use crate::path::ModelPath;
use crate::tree::ModelTree;
use modelstack_types::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOperation {
    Update,
    Restore,
}

/// `{path, operation, oldValue, newValue}` as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelChangeSet {
    pub path: ModelPath,
    pub operation: ModelOperation,
    pub old_value: Value,
    pub new_value: Value,
}

pub struct ChangeSetBuilder;

impl ChangeSetBuilder {
    /// Change-set for the current state of an attribute edited in `context`.
    pub fn update(tree: &ModelTree, attribute: AttributeId, context: NodeId) -> ModelResult<ModelChangeSet> {
        let model = tree.attribute(attribute);
        let old_value = model.value().baseline();
        let new_value = Self::convert_value(&old_value, model.current_value());
        Ok(ModelChangeSet {
            path: ModelPath::for_attribute(tree, attribute, context)?,
            operation: ModelOperation::Update,
            old_value,
            new_value,
        })
    }

    /// Change-set for an override that was removed in favour of `restored`.
    pub fn restore(
        tree: &ModelTree,
        removed: AttributeId,
        restored: AttributeId,
        context: NodeId,
    ) -> ModelResult<ModelChangeSet> {
        let old_value = tree.attribute(removed).current_value();
        let new_value = Self::convert_value(&old_value, tree.attribute(restored).current_value());
        Ok(ModelChangeSet {
            path: ModelPath::for_attribute(tree, removed, context)?,
            operation: ModelOperation::Restore,
            old_value,
            new_value,
        })
    }

    /// Change-set for an overriding node that was removed. Carries no values:
    /// the service drops the override and everything it owned.
    pub fn restore_node(tree: &ModelTree, removed: NodeId, context: NodeId) -> ModelResult<ModelChangeSet> {
        Ok(ModelChangeSet {
            path: ModelPath::for_node(tree, removed, context)?,
            operation: ModelOperation::Restore,
            old_value: Value::Null,
            new_value: Value::Null,
        })
    }

    /// Update change-sets for every dirty attribute `context` owns.
    pub fn collect(tree: &ModelTree, context: NodeId) -> ModelResult<Vec<ModelChangeSet>> {
        let mut change_sets = Vec::new();
        let mut pending = vec![context];
        while let Some(node) = pending.pop() {
            for attribute in tree.owned_attributes(node) {
                if tree.attribute(attribute).is_dirty() {
                    change_sets.push(Self::update(tree, attribute, context)?);
                }
            }
            let mut children = tree.owned_children(node);
            children.reverse();
            pending.extend(children);
        }
        Ok(change_sets)
    }

    /// Emits numeric text as a number when the old value was empty or a
    /// safe integer. Form inputs produce text even for numeric attributes.
    pub fn convert_value(old_value: &Value, new_value: Value) -> Value {
        if !(old_value.is_null() || is_safe_integer(old_value)) {
            return new_value;
        }
        let Value::String(text) = &new_value else {
            return new_value;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return new_value;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => to_number(number).unwrap_or(new_value),
            _ => new_value,
        }
    }
}

fn is_safe_integer(value: &Value) -> bool {
    let Value::Number(number) = value else {
        return false;
    };
    if let Some(integer) = number.as_i64() {
        return integer.unsigned_abs() <= MAX_SAFE_INTEGER;
    }
    if let Some(integer) = number.as_u64() {
        return integer <= MAX_SAFE_INTEGER;
    }
    number
        .as_f64()
        .is_some_and(|float| float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER as f64)
}

fn to_number(number: f64) -> Option<Value> {
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER as f64 {
        return Some(Value::from(number as i64));
    }
    Number::from_f64(number).map(Value::Number)
}
