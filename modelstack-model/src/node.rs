//! Model entities: the closed set of entity kinds and the arena node that
//! carries them.

use crate::error::{ModelError, ModelResult};
use crate::list::ModelList;
use modelstack_types::{AttributeId, Language, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The type tag used in paths and change-sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelType {
    Class,
    Definition,
    Field,
    Region,
    Control,
    ControlParam,
    Header,
    Action,
    ActionExecution,
    ActionGroup,
    Property,
    Attribute,
}

impl ModelType {
    pub const ALL: [ModelType; 12] = [
        ModelType::Class,
        ModelType::Definition,
        ModelType::Field,
        ModelType::Region,
        ModelType::Control,
        ModelType::ControlParam,
        ModelType::Header,
        ModelType::Action,
        ModelType::ActionExecution,
        ModelType::ActionGroup,
        ModelType::Property,
        ModelType::Attribute,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ModelType::Class => "class",
            ModelType::Definition => "definition",
            ModelType::Field => "field",
            ModelType::Region => "region",
            ModelType::Control => "control",
            ModelType::ControlParam => "controlParam",
            ModelType::Header => "header",
            ModelType::Action => "action",
            ModelType::ActionExecution => "actionExecution",
            ModelType::ActionGroup => "actionGroup",
            ModelType::Property => "property",
            ModelType::Attribute => "attribute",
        }
    }

    /// Top-level models are addressed directly by the service; everything
    /// else lives inside one of them.
    pub const fn is_top_level(&self) -> bool {
        matches!(self, ModelType::Class | ModelType::Definition | ModelType::Property)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ModelError::InvalidValue(format!("unknown model type: {s}")))
    }
}

/// Kind-specific payload of a node, including its child collections.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    Class,
    Definition {
        class: Option<NodeId>,
        fields: ModelList<NodeId>,
        regions: ModelList<NodeId>,
        headers: ModelList<NodeId>,
        actions: ModelList<NodeId>,
        action_groups: ModelList<NodeId>,
    },
    Field {
        region_id: Option<String>,
        controls: ModelList<NodeId>,
    },
    /// A region's fields are the definition's fields naming the region.
    Region,
    Control {
        params: ModelList<NodeId>,
    },
    ControlParam,
    Header,
    Action {
        executions: ModelList<NodeId>,
    },
    ActionExecution,
    ActionGroup,
    Property,
}

impl ModelKind {
    /// An empty kind of the given type. Attributes are not nodes.
    pub fn empty(model_type: ModelType) -> Option<Self> {
        let kind = match model_type {
            ModelType::Class => Self::Class,
            ModelType::Definition => Self::Definition {
                class: None,
                fields: ModelList::new(),
                regions: ModelList::new(),
                headers: ModelList::new(),
                actions: ModelList::new(),
                action_groups: ModelList::new(),
            },
            ModelType::Field => Self::Field {
                region_id: None,
                controls: ModelList::new(),
            },
            ModelType::Region => Self::Region,
            ModelType::Control => Self::Control {
                params: ModelList::new(),
            },
            ModelType::ControlParam => Self::ControlParam,
            ModelType::Header => Self::Header,
            ModelType::Action => Self::Action {
                executions: ModelList::new(),
            },
            ModelType::ActionExecution => Self::ActionExecution,
            ModelType::ActionGroup => Self::ActionGroup,
            ModelType::Property => Self::Property,
            ModelType::Attribute => return None,
        };
        Some(kind)
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Class => ModelType::Class,
            Self::Definition { .. } => ModelType::Definition,
            Self::Field { .. } => ModelType::Field,
            Self::Region => ModelType::Region,
            Self::Control { .. } => ModelType::Control,
            Self::ControlParam => ModelType::ControlParam,
            Self::Header => ModelType::Header,
            Self::Action { .. } => ModelType::Action,
            Self::ActionExecution => ModelType::ActionExecution,
            Self::ActionGroup => ModelType::ActionGroup,
            Self::Property => ModelType::Property,
        }
    }

    /// Child types this kind holds collections for.
    pub fn child_types(&self) -> &'static [ModelType] {
        match self {
            Self::Definition { .. } => &[
                ModelType::Field,
                ModelType::Region,
                ModelType::Header,
                ModelType::Action,
                ModelType::ActionGroup,
            ],
            Self::Field { .. } => &[ModelType::Control],
            Self::Control { .. } => &[ModelType::ControlParam],
            Self::Action { .. } => &[ModelType::ActionExecution],
            _ => &[],
        }
    }

    pub fn child_list(&self, child_type: ModelType) -> Option<&ModelList<NodeId>> {
        match (self, child_type) {
            (Self::Definition { fields, .. }, ModelType::Field) => Some(fields),
            (Self::Definition { regions, .. }, ModelType::Region) => Some(regions),
            (Self::Definition { headers, .. }, ModelType::Header) => Some(headers),
            (Self::Definition { actions, .. }, ModelType::Action) => Some(actions),
            (Self::Definition { action_groups, .. }, ModelType::ActionGroup) => Some(action_groups),
            (Self::Field { controls, .. }, ModelType::Control) => Some(controls),
            (Self::Control { params }, ModelType::ControlParam) => Some(params),
            (Self::Action { executions }, ModelType::ActionExecution) => Some(executions),
            _ => None,
        }
    }

    fn child_list_mut(&mut self, child_type: ModelType) -> Option<&mut ModelList<NodeId>> {
        match (self, child_type) {
            (Self::Definition { fields, .. }, ModelType::Field) => Some(fields),
            (Self::Definition { regions, .. }, ModelType::Region) => Some(regions),
            (Self::Definition { headers, .. }, ModelType::Header) => Some(headers),
            (Self::Definition { actions, .. }, ModelType::Action) => Some(actions),
            (Self::Definition { action_groups, .. }, ModelType::ActionGroup) => Some(action_groups),
            (Self::Field { controls, .. }, ModelType::Control) => Some(controls),
            (Self::Control { params }, ModelType::ControlParam) => Some(params),
            (Self::Action { executions }, ModelType::ActionExecution) => Some(executions),
            _ => None,
        }
    }

    /// Every child collection with its type.
    pub fn child_lists(&self) -> Vec<(ModelType, &ModelList<NodeId>)> {
        self.child_types()
            .iter()
            .filter_map(|&ty| self.child_list(ty).map(|list| (ty, list)))
            .collect()
    }

    fn unsealed_copy(&self) -> Self {
        let mut copy = self.clone();
        for &ty in self.child_types() {
            if let (Some(target), Some(source)) = (copy.child_list_mut(ty), self.child_list(ty)) {
                *target = source.unsealed_copy();
            }
        }
        copy
    }

    fn seal_lists(&mut self) {
        for &ty in self.child_types() {
            if let Some(list) = self.child_list_mut(ty) {
                list.seal();
            }
        }
    }
}

/// A node of the model tree.
///
/// For top-level models `parent` is the inheritance parent. For nested
/// entities it is the structural owner. `reference` points at the inherited
/// node an owned copy overrides.
#[derive(Debug, Clone)]
pub struct ModelNode {
    id: String,
    kind: ModelKind,
    parent: Option<NodeId>,
    reference: Option<NodeId>,
    attributes: ModelList<AttributeId>,
    labels: BTreeMap<Language, String>,
    children: Vec<NodeId>,
    is_abstract: bool,
    loaded: bool,
    sealed: bool,
}

impl ModelNode {
    pub fn new(id: impl Into<String>, kind: ModelKind, parent: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            kind,
            parent,
            reference: None,
            attributes: ModelList::new(),
            labels: BTreeMap::new(),
            children: Vec::new(),
            is_abstract: false,
            loaded: false,
            sealed: false,
        }
    }

    /// An owned copy of `self` placed under `owner`, referencing `source`.
    ///
    /// Collections are copied shallowly: the copy initially shares every
    /// attribute and child with the inherited node.
    pub(crate) fn override_of(&self, source: NodeId, owner: NodeId) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind.unsealed_copy(),
            parent: Some(owner),
            reference: Some(source),
            attributes: self.attributes.unsealed_copy(),
            labels: self.labels.clone(),
            children: Vec::new(),
            is_abstract: self.is_abstract,
            loaded: true,
            sealed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    pub fn model_type(&self) -> ModelType {
        self.kind.model_type()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn reference(&self) -> Option<NodeId> {
        self.reference
    }

    pub fn attributes(&self) -> &ModelList<AttributeId> {
        &self.attributes
    }

    pub fn labels(&self) -> &BTreeMap<Language, String> {
        &self.labels
    }

    /// Definitions and classes inheriting from this model.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_list(&self, child_type: ModelType) -> Option<&ModelList<NodeId>> {
        self.kind.child_list(child_type)
    }

    /// The class of a definition.
    pub fn class(&self) -> Option<NodeId> {
        match &self.kind {
            ModelKind::Definition { class, .. } => *class,
            _ => None,
        }
    }

    /// The region a field is placed in.
    pub fn region_id(&self) -> Option<&str> {
        match &self.kind {
            ModelKind::Field { region_id, .. } => region_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn check_mutable(&self) -> ModelResult<()> {
        if self.sealed {
            return Err(ModelError::Sealed(format!("{} {}", self.model_type(), self.id)));
        }
        Ok(())
    }

    pub(crate) fn attributes_mut(&mut self) -> ModelResult<&mut ModelList<AttributeId>> {
        self.check_mutable()?;
        Ok(&mut self.attributes)
    }

    pub(crate) fn child_list_mut(&mut self, child_type: ModelType) -> ModelResult<&mut ModelList<NodeId>> {
        self.check_mutable()?;
        let model_type = self.model_type();
        let id = self.id.clone();
        self.kind
            .child_list_mut(child_type)
            .ok_or_else(|| ModelError::InvalidChild {
                model: format!("{model_type} {id}"),
                child: child_type.to_string(),
            })
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn set_reference(&mut self, reference: Option<NodeId>) {
        self.reference = reference;
    }

    pub(crate) fn set_class(&mut self, node: NodeId) {
        if let ModelKind::Definition { class, .. } = &mut self.kind {
            *class = Some(node);
        }
    }

    pub(crate) fn set_region_id(&mut self, region: Option<String>) {
        if let ModelKind::Field { region_id, .. } = &mut self.kind {
            *region_id = region;
        }
    }

    pub(crate) fn add_inheritor(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_inheritor(&mut self, child: NodeId) {
        self.children.retain(|&existing| existing != child);
    }

    pub(crate) fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn set_label(&mut self, language: Language, label: impl Into<String>) {
        self.labels.insert(language, label.into());
    }

    pub(crate) fn seal(&mut self) {
        self.attributes.seal();
        self.kind.seal_lists();
        self.sealed = true;
    }
}
