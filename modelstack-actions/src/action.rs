use modelstack_model::{ModelRef, Replacement};
use modelstack_types::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An edit made in the context of one top-level model.
///
/// `context` is the class, definition or property the user is editing. The
/// target may be inherited from one of its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModelAction {
    /// Set an attribute value, overriding it first when inherited.
    ChangeAttribute {
        attribute: AttributeId,
        context: NodeId,
        value: Value,
    },
    /// Drop an override (`inherited`) or reset an own value to its baseline.
    RestoreAttribute {
        attribute: AttributeId,
        context: NodeId,
        inherited: bool,
    },
    /// Replace an overriding field, region, action, ... by the node it overrides.
    RestoreInheritedNode { node: NodeId, context: NodeId },
}

impl ModelAction {
    pub fn context(&self) -> NodeId {
        match self {
            ModelAction::ChangeAttribute { context, .. }
            | ModelAction::RestoreAttribute { context, .. }
            | ModelAction::RestoreInheritedNode { context, .. } => *context,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelAction::ChangeAttribute { .. } => "change_attribute",
            ModelAction::RestoreAttribute { .. } => "restore_attribute",
            ModelAction::RestoreInheritedNode { .. } => "restore_inherited_node",
        }
    }
}

/// Outcome of an executed action, kept for change-sets and undo.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedAction {
    pub action: ModelAction,
    /// The element now holding the edit. Differs from the action's target
    /// when an override was created or removed.
    pub result: ModelRef,
    /// Value of the result before the action, for in-place edits.
    pub previous_value: Option<Value>,
    /// Collection entries the action swapped, outermost first.
    pub replaced: Vec<Replacement>,
}

impl ExecutedAction {
    /// Whether the action swapped entries instead of editing in place.
    pub fn is_structural(&self) -> bool {
        !self.replaced.is_empty()
    }

    pub fn result_attribute(&self) -> Option<AttributeId> {
        self.result.as_attribute()
    }
}
