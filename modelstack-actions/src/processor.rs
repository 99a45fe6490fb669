//! Action processor: applies edits to the model tree.
//!
//! Edits on elements owned by the context are made in place. Edits on
//! inherited elements go through [`ModelTree::copy_from_path`], so the
//! ancestor they come from is never mutated.

use crate::action::{ExecutedAction, ModelAction};
use crate::error::{ActionError, ActionResult};
use modelstack_model::{
    AttributeValidator, ChangeSetBuilder, ModelChangeSet, ModelPath, ModelRef, ModelTree, Replacement,
};
use modelstack_types::{AttributeId, NodeId};
use serde_json::Value;
use tracing::{debug, warn};

struct Outcome {
    result: ModelRef,
    previous_value: Option<Value>,
    replaced: Vec<Replacement>,
}

/// Executes, reverts and describes [`ModelAction`]s.
#[derive(Debug, Clone, Default)]
pub struct ActionProcessor {
    validator: AttributeValidator,
}

impl ActionProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(validator: AttributeValidator) -> Self {
        Self { validator }
    }

    /// Applies an action. On failure the tree is left as it was.
    ///
    /// Validation is refreshed for what the action touched; a rule that
    /// cannot be evaluated is logged and does not fail the action.
    pub fn execute(&self, tree: &mut ModelTree, action: ModelAction) -> ActionResult<ExecutedAction> {
        let context = action.context();
        check_context(tree, context)?;
        debug!(
            action = action.name(),
            context = tree.node(context).id(),
            "executing model action"
        );

        let outcome = match &action {
            ModelAction::ChangeAttribute {
                attribute,
                context,
                value,
            } => self.change_attribute(tree, *attribute, *context, value.clone())?,
            ModelAction::RestoreAttribute {
                attribute,
                context,
                inherited,
            } => self.restore_attribute(tree, *attribute, *context, *inherited)?,
            ModelAction::RestoreInheritedNode { node, context } => {
                self.restore_inherited_node(tree, *node, *context)?
            }
        };

        Ok(ExecutedAction {
            action,
            result: outcome.result,
            previous_value: outcome.previous_value,
            replaced: outcome.replaced,
        })
    }

    fn change_attribute(
        &self,
        tree: &mut ModelTree,
        attribute: AttributeId,
        context: NodeId,
        value: Value,
    ) -> ActionResult<Outcome> {
        check_attribute(tree, attribute)?;
        if tree.is_owned_by(attribute, context) {
            let previous = tree.attribute(attribute).current_value();
            tree.attribute_mut(attribute).set_value(value)?;
            let holder = tree.attribute(attribute).parent();
            self.revalidate_holder(tree, context, holder);
            return Ok(Outcome {
                result: ModelRef::Attribute(attribute),
                previous_value: Some(previous),
                replaced: Vec::new(),
            });
        }

        let path = ModelPath::for_attribute(tree, attribute, context)?;
        let resolution = tree.copy_from_path(&path, context)?;
        let copy = resolution
            .target
            .as_attribute()
            .ok_or_else(|| ActionError::Inconsistent(format!("{path} did not resolve to an attribute")))?;
        let previous = tree.attribute(copy).current_value();
        if let Err(error) = tree.attribute_mut(copy).set_value(value) {
            undo_all(tree, &resolution.replaced);
            return Err(error.into());
        }
        debug!(%path, overridden = resolution.replaced.len(), "changed inherited attribute");
        let holder = tree.attribute(copy).parent();
        self.revalidate_holder(tree, context, holder);

        Ok(Outcome {
            result: ModelRef::Attribute(copy),
            previous_value: Some(previous),
            replaced: resolution.replaced,
        })
    }

    fn restore_attribute(
        &self,
        tree: &mut ModelTree,
        attribute: AttributeId,
        context: NodeId,
        inherited: bool,
    ) -> ActionResult<Outcome> {
        check_attribute(tree, attribute)?;
        if inherited {
            let path = ModelPath::for_attribute(tree, attribute, context)?;
            let resolution = tree.restore_from_path(&path, context)?;
            let previous = resolution
                .replaced
                .first()
                .and_then(|replacement| replacement.previous.as_attribute())
                .map(|removed| tree.attribute(removed).current_value());
            debug!(%path, "restored inherited attribute");
            self.revalidate_replaced(tree, context, &resolution.replaced, false);
            return Ok(Outcome {
                result: resolution.target,
                previous_value: previous,
                replaced: resolution.replaced,
            });
        }

        if !tree.is_owned_by(attribute, context) {
            return Err(ActionError::NotOwned {
                attribute: tree.attribute(attribute).id().to_string(),
                context: tree.node(context).id().to_string(),
            });
        }
        let previous = tree.attribute(attribute).current_value();
        tree.attribute_mut(attribute).restore_attribute()?;
        let holder = tree.attribute(attribute).parent();
        self.revalidate_holder(tree, context, holder);
        Ok(Outcome {
            result: ModelRef::Attribute(attribute),
            previous_value: Some(previous),
            replaced: Vec::new(),
        })
    }

    fn restore_inherited_node(&self, tree: &mut ModelTree, node: NodeId, context: NodeId) -> ActionResult<Outcome> {
        if tree.try_node(node).is_none() {
            return Err(ActionError::UnknownHandle(node.to_string()));
        }
        let path = ModelPath::for_node(tree, node, context)?;
        let resolution = tree.restore_from_path(&path, context)?;
        debug!(%path, "restored inherited model");
        self.revalidate_replaced(tree, context, &resolution.replaced, false);
        Ok(Outcome {
            result: resolution.target,
            previous_value: None,
            replaced: resolution.replaced,
        })
    }

    /// Undoes an executed action.
    ///
    /// Swapped entries are put back, which detaches an override created by
    /// the action or re-attaches one it removed. In-place edits get their
    /// previous value back.
    pub fn revert(&self, tree: &mut ModelTree, executed: &ExecutedAction) -> ActionResult<()> {
        let context = executed.action.context();
        if executed.is_structural() {
            for replacement in executed.replaced.iter().rev() {
                tree.undo_replacement(replacement)?;
            }
            self.revalidate_replaced(tree, context, &executed.replaced, true);
            debug!(action = executed.action.name(), "reverted structural action");
            return Ok(());
        }

        let (ModelRef::Attribute(attribute), Some(previous)) = (executed.result, &executed.previous_value) else {
            return Err(ActionError::Inconsistent(format!(
                "{} has no previous value",
                executed.action.name()
            )));
        };
        check_attribute(tree, attribute)?;
        let target = tree.attribute_mut(attribute);
        if *previous == target.value().baseline() {
            target.restore_attribute()?;
        } else {
            let current = target.current_value();
            target.set_value(revert_value(current, previous))?;
        }
        let holder = tree.attribute(attribute).parent();
        self.revalidate_holder(tree, context, holder);
        debug!(action = executed.action.name(), "reverted model action");
        Ok(())
    }

    /// The change-set describing an executed action.
    pub fn changeset(&self, tree: &ModelTree, executed: &ExecutedAction) -> ActionResult<ModelChangeSet> {
        let context = executed.action.context();
        let removed = executed.replaced.first().map(|replacement| replacement.previous);
        let change_set = match (&executed.action, executed.result, removed) {
            (
                ModelAction::RestoreAttribute { inherited: true, .. },
                ModelRef::Attribute(restored),
                Some(ModelRef::Attribute(removed)),
            ) => ChangeSetBuilder::restore(tree, removed, restored, context)?,
            (ModelAction::RestoreInheritedNode { .. }, ModelRef::Node(_), Some(ModelRef::Node(removed))) => {
                ChangeSetBuilder::restore_node(tree, removed, context)?
            }
            (
                ModelAction::ChangeAttribute { .. } | ModelAction::RestoreAttribute { .. },
                ModelRef::Attribute(attribute),
                _,
            ) => ChangeSetBuilder::update(tree, attribute, context)?,
            (action, ..) => {
                return Err(ActionError::Inconsistent(format!(
                    "{} has no change-set for {:?}",
                    action.name(),
                    executed.result
                )));
            }
        };
        Ok(change_set)
    }

    /// Revalidates every attribute `holder` holds in `context`, since rules
    /// may refer to siblings. The edit stands even when a rule cannot be
    /// evaluated.
    fn revalidate_holder(&self, tree: &mut ModelTree, context: NodeId, holder: NodeId) {
        let attributes = tree.node(holder).attributes().models().to_vec();
        for attribute in attributes {
            if let Err(error) = self.validator.validate(tree, context, holder, attribute) {
                warn!(%error, attribute = tree.attribute(attribute).id(), "attribute not validated");
            }
        }
    }

    /// Revalidates what sits in the outermost swapped entry: the previous
    /// entry after an undo, the current one otherwise.
    fn revalidate_replaced(&self, tree: &mut ModelTree, context: NodeId, replaced: &[Replacement], undone: bool) {
        let Some(replacement) = replaced.first() else {
            return;
        };
        let entry = if undone { replacement.previous } else { replacement.current };
        match entry {
            ModelRef::Attribute(_) => self.revalidate_holder(tree, context, replacement.owner),
            ModelRef::Node(node) => self.revalidate_node(tree, context, node),
        }
    }

    fn revalidate_node(&self, tree: &mut ModelTree, context: NodeId, node: NodeId) {
        self.revalidate_holder(tree, context, node);
        for child in tree.held_children(node) {
            self.revalidate_node(tree, context, child);
        }
    }
}

fn check_context(tree: &ModelTree, context: NodeId) -> ActionResult<()> {
    let node = tree
        .try_node(context)
        .ok_or_else(|| ActionError::UnknownHandle(context.to_string()))?;
    if !node.model_type().is_top_level() {
        return Err(ActionError::InvalidContext(node.id().to_string()));
    }
    Ok(())
}

fn check_attribute(tree: &ModelTree, attribute: AttributeId) -> ActionResult<()> {
    if tree.try_attribute(attribute).is_none() {
        return Err(ActionError::UnknownHandle(attribute.to_string()));
    }
    Ok(())
}

/// Rolls back replacements made before a later step failed.
fn undo_all(tree: &mut ModelTree, replaced: &[Replacement]) {
    for replacement in replaced.iter().rev() {
        if let Err(error) = tree.undo_replacement(replacement) {
            warn!(%error, key = %replacement.key, "failed to roll back override");
        }
    }
}

/// The value to set to get back to `previous`. Languages added since are
/// cleared rather than kept.
fn revert_value(current: Value, previous: &Value) -> Value {
    match (current, previous) {
        (Value::Object(current), Value::Object(previous)) => {
            let mut reverted = previous.clone();
            for language in current.keys() {
                reverted.entry(language.clone()).or_insert(Value::Null);
            }
            Value::Object(reverted)
        }
        _ => previous.clone(),
    }
}
