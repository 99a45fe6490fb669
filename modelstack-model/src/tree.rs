//! The model tree: an arena of nodes and attributes plus the top-level model
//! index.
//!
//! Handles (`NodeId`, `AttributeId`) are arena indices. A new instance always
//! gets a new handle, so "is this the same object" questions are answered by
//! comparing handles.
//!
//! Inheritance is expressed by sharing handles: a child definition's
//! collections start as shallow copies of its parent's, so an inherited
//! entry is the very same handle in both. Editing inherited data never
//! mutates the shared instance. [`ModelTree::copy_from_path`] replaces the
//! inherited entries along a path with owned copies instead, and
//! [`ModelTree::restore_from_path`] swaps an owned copy back for the handle
//! it overrides.

use crate::attribute::{AttributeSource, AttributeValidation, ModelAttribute};
use crate::description::LanguagePreference;
use crate::error::{ModelError, ModelResult};
use crate::list::{ModelList, Sealable};
use crate::node::{ModelKind, ModelNode, ModelType};
use crate::path::ModelPath;
use crate::value::AttributeValue;
use modelstack_types::{AttributeId, Language, NodeId};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Attribute names holding a model's display label, in lookup order.
pub const LABEL_ATTRIBUTES: &[&str] = &[
    "label",
    "http://purl.org/dc/terms/title",
    "http://www.w3.org/2000/01/rdf-schema#label",
];

/// A handle to either kind of tree element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRef {
    Node(NodeId),
    Attribute(AttributeId),
}

impl ModelRef {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            ModelRef::Node(node) => Some(*node),
            ModelRef::Attribute(_) => None,
        }
    }

    pub fn as_attribute(&self) -> Option<AttributeId> {
        match self {
            ModelRef::Attribute(attribute) => Some(*attribute),
            ModelRef::Node(_) => None,
        }
    }
}

/// One collection entry swapped by an override or a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub owner: NodeId,
    pub model_type: ModelType,
    pub key: String,
    pub previous: ModelRef,
    pub current: ModelRef,
}

/// Result of resolving a path with [`ModelTree::copy_from_path`] or
/// [`ModelTree::restore_from_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    pub target: ModelRef,
    /// Entries replaced in the path owners, outermost first. Entries
    /// replaced in inheriting models are not listed.
    pub replaced: Vec<Replacement>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
    attributes: Vec<ModelAttribute>,
    models: ModelList<NodeId>,
    properties: ModelList<NodeId>,
    /// Validation of inherited attributes, keyed by the model they were
    /// validated in.
    inherited_validation: HashMap<(NodeId, AttributeId), AttributeValidation>,
}

impl ModelTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arena ────────────────────────────────────────────────────

    /// Panics if the handle was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &ModelNode {
        &self.nodes[id.index()]
    }

    pub fn try_node(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ModelNode {
        &mut self.nodes[id.index()]
    }

    /// Panics if the handle was not issued by this tree.
    pub fn attribute(&self, id: AttributeId) -> &ModelAttribute {
        &self.attributes[id.index()]
    }

    pub fn try_attribute(&self, id: AttributeId) -> Option<&ModelAttribute> {
        self.attributes.get(id.index())
    }

    /// Mutable access to an attribute. Attributes guard their own sealed
    /// and read-only state.
    pub fn attribute_mut(&mut self, id: AttributeId) -> &mut ModelAttribute {
        &mut self.attributes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn add_node(&mut self, node: ModelNode) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_attribute(&mut self, attribute: ModelAttribute) -> AttributeId {
        let id = AttributeId::from_index(self.attributes.len());
        self.attributes.push(attribute);
        id
    }

    // ── Top-level models ─────────────────────────────────────────

    /// Creates an empty node. Top-level nodes are registered in the model
    /// index and attached to their inheritance parent.
    pub fn create_node(
        &mut self,
        id: impl Into<String>,
        model_type: ModelType,
        parent: Option<NodeId>,
    ) -> ModelResult<NodeId> {
        let id = id.into();
        let kind = ModelKind::empty(model_type).ok_or_else(|| ModelError::InvalidChild {
            model: "model tree".to_string(),
            child: format!("{model_type} {id}"),
        })?;
        let node = self.add_node(ModelNode::new(id, kind, parent));
        if model_type.is_top_level() {
            self.register_model(node)?;
            if let Some(parent) = parent {
                self.node_mut(parent).add_inheritor(node);
            }
        }
        Ok(node)
    }

    /// Creates a definition under `parent`.
    ///
    /// Under a definition the new model inherits from it and joins its
    /// class. Under a class it becomes a root definition of that class.
    pub fn create_definition(&mut self, id: impl Into<String>, parent: NodeId) -> ModelResult<NodeId> {
        let (inherits, class) = match self.node(parent).model_type() {
            ModelType::Class => (None, Some(parent)),
            ModelType::Definition => (Some(parent), self.node(parent).class()),
            other => {
                return Err(ModelError::InvalidChild {
                    model: format!("{other} {}", self.node(parent).id()),
                    child: format!("definition {}", id.into()),
                });
            }
        };
        let node = self.create_node(id, ModelType::Definition, inherits)?;
        if let Some(class) = class {
            self.node_mut(node).set_class(class);
        }
        Ok(node)
    }

    pub fn register_model(&mut self, node: NodeId) -> ModelResult<()> {
        let (key, model_type) = {
            let model = self.node(node);
            (model.id().to_string(), model.model_type())
        };
        match model_type {
            ModelType::Property => self.properties.insert_keyed(key, node)?,
            ModelType::Class | ModelType::Definition => self.models.insert_keyed(key, node)?,
            other => {
                return Err(ModelError::InvalidChild {
                    model: "model tree".to_string(),
                    child: format!("{other} {key}"),
                });
            }
        };
        Ok(())
    }

    /// Looks up a class or definition.
    pub fn get_model(&self, id: &str) -> Option<NodeId> {
        self.models.get_model(id).copied()
    }

    pub fn get_property(&self, uri: &str) -> Option<NodeId> {
        self.properties.get_model(uri).copied()
    }

    pub fn has_model(&self, id: &str) -> bool {
        self.models.has_model(id)
    }

    pub fn models(&self) -> &ModelList<NodeId> {
        &self.models
    }

    pub fn properties(&self) -> &ModelList<NodeId> {
        &self.properties
    }

    /// Makes `parent` the inheritance parent of the top-level `child`.
    pub(crate) fn link_parent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(previous) = self.node(child).parent() {
            self.node_mut(previous).remove_inheritor(child);
        }
        self.node_mut(child).set_parent(Some(parent));
        self.node_mut(parent).add_inheritor(child);
    }

    /// Inheritance chain of a top-level model, nearest ancestor first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(node).parent();
        while let Some(ancestor) = current {
            if chain.contains(&ancestor) || ancestor == node {
                warn!(model = self.node(node).id(), "inheritance cycle");
                break;
            }
            chain.push(ancestor);
            current = self.node(ancestor).parent();
        }
        chain
    }

    // ── Children & attributes ────────────────────────────────────

    /// Inserts `child` into the matching collection of `owner`, replacing an
    /// entry with the same id in place.
    pub fn add_child(&mut self, owner: NodeId, child: NodeId) -> ModelResult<Option<NodeId>> {
        let (model_type, key) = {
            let node = self.node(child);
            (node.model_type(), node.id().to_string())
        };
        self.node_mut(owner).child_list_mut(model_type)?.insert_keyed(key, child)
    }

    pub fn child(&self, owner: NodeId, model_type: ModelType, id: &str) -> Option<NodeId> {
        self.node(owner).child_list(model_type)?.get_model(id).copied()
    }

    pub fn children_of(&self, owner: NodeId, model_type: ModelType) -> Vec<NodeId> {
        self.node(owner)
            .child_list(model_type)
            .map(|list| list.models().to_vec())
            .unwrap_or_default()
    }

    /// Fields of a definition placed in the given region.
    pub fn region_fields(&self, definition: NodeId, region_id: &str) -> Vec<NodeId> {
        self.children_of(definition, ModelType::Field)
            .into_iter()
            .filter(|&field| self.node(field).region_id() == Some(region_id))
            .collect()
    }

    /// Inserts `attribute` into the attributes of `owner`.
    pub fn set_attribute(&mut self, owner: NodeId, attribute: AttributeId) -> ModelResult<Option<AttributeId>> {
        let key = self.attribute(attribute).id().to_string();
        self.node_mut(owner).attributes_mut()?.insert_keyed(key, attribute)
    }

    pub fn attribute_of(&self, node: NodeId, name: &str) -> Option<AttributeId> {
        self.node(node).attributes().get_model(name).copied()
    }

    pub fn attribute_value(&self, node: NodeId, name: &str) -> Option<Value> {
        self.attribute_of(node, name)
            .map(|attribute| self.attribute(attribute).current_value())
    }

    // ── Ownership & aggregate state ──────────────────────────────

    /// Attributes held by `node` that it owns rather than inherits.
    pub fn owned_attributes(&self, node: NodeId) -> Vec<AttributeId> {
        self.node(node)
            .attributes()
            .models()
            .iter()
            .copied()
            .filter(|&attribute| self.attribute(attribute).parent() == node)
            .collect()
    }

    /// Children held by `node` that it owns rather than inherits.
    pub fn owned_children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .kind()
            .child_lists()
            .into_iter()
            .flat_map(|(_, list)| list.models().iter().copied())
            .filter(|&child| self.node(child).parent() == Some(node))
            .collect()
    }

    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.owned_attributes(node)
            .into_iter()
            .any(|attribute| self.attribute(attribute).is_dirty())
            || self
                .owned_children(node)
                .into_iter()
                .any(|child| self.is_dirty(child))
    }

    pub fn is_owning_models(&self, node: NodeId) -> bool {
        !self.owned_attributes(node).is_empty() || !self.owned_children(node).is_empty()
    }

    /// Every child `node` holds, inherited ones included.
    pub fn held_children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .kind()
            .child_lists()
            .into_iter()
            .flat_map(|(_, list)| list.models().iter().copied())
            .collect()
    }

    /// Whether the last validation found no errors in anything `node`
    /// holds, as seen from the model it belongs to.
    pub fn is_valid(&self, node: NodeId) -> bool {
        self.is_valid_in(self.owning_model(node), node)
    }

    /// Like [`ModelTree::is_valid`], with inherited entries read as
    /// validated in `context`.
    pub fn is_valid_in(&self, context: NodeId, node: NodeId) -> bool {
        self.node(node)
            .attributes()
            .models()
            .iter()
            .all(|&attribute| self.validation(context, attribute).is_valid())
            && self
                .held_children(node)
                .into_iter()
                .all(|child| self.is_valid_in(context, child))
    }

    /// Validation state of an attribute as seen from `context`.
    ///
    /// Owned attributes carry their own state. Inherited ones fall back to
    /// the state recorded by their owner until validated in `context`.
    pub fn validation(&self, context: NodeId, attribute: AttributeId) -> &AttributeValidation {
        if self.is_owned_by(attribute, context) {
            return self.attribute(attribute).validation();
        }
        self.inherited_validation
            .get(&(context, attribute))
            .unwrap_or_else(|| self.attribute(attribute).validation())
    }

    /// Records the validation of an attribute in `context`. Attributes
    /// inherited by `context` are left untouched.
    pub fn set_validation(&mut self, context: NodeId, attribute: AttributeId, validation: AttributeValidation) {
        if self.is_owned_by(attribute, context) {
            *self.attribute_mut(attribute).validation_mut() = validation;
        } else {
            self.inherited_validation.insert((context, attribute), validation);
        }
    }

    /// Top-level models with unsaved changes, in model order.
    pub fn dirty_models(&self) -> Vec<NodeId> {
        self.models
            .models()
            .iter()
            .chain(self.properties.models())
            .copied()
            .filter(|&model| self.is_dirty(model))
            .collect()
    }

    /// The top-level model a node belongs to.
    pub fn owning_model(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while !self.node(current).model_type().is_top_level() {
            match self.node(current).parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Whether the attribute belongs to `context` itself rather than being
    /// inherited from an ancestor.
    pub fn is_owned_by(&self, attribute: AttributeId, context: NodeId) -> bool {
        self.owning_model(self.attribute(attribute).parent()) == context
    }

    // ── Copy-on-write ────────────────────────────────────────────

    fn invalid_path(path: &ModelPath, reason: impl Into<String>) -> ModelError {
        ModelError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    fn check_root(&self, path: &ModelPath, context: NodeId) -> ModelResult<()> {
        let root = path
            .first()
            .ok_or_else(|| Self::invalid_path(path, "empty path"))?;
        let model = self.node(context);
        if root.id != model.id() || root.model_type != model.model_type() {
            return Err(Self::invalid_path(
                path,
                format!("path is not rooted at {} {}", model.model_type(), model.id()),
            ));
        }
        Ok(())
    }

    /// Resolves `path` starting from `context` without modifying anything.
    pub fn resolve_path(&self, path: &ModelPath, context: NodeId) -> ModelResult<ModelRef> {
        self.check_root(path, context)?;
        let mut owner = context;
        let segments = path.segments();
        for (position, segment) in segments.iter().enumerate().skip(1) {
            if segment.model_type == ModelType::Attribute {
                if position + 1 != segments.len() {
                    return Err(Self::invalid_path(path, "attribute must be the last segment"));
                }
                return self
                    .attribute_of(owner, &segment.id)
                    .map(ModelRef::Attribute)
                    .ok_or_else(|| Self::invalid_path(path, format!("no attribute {}", segment.id)));
            }
            owner = self
                .child(owner, segment.model_type, &segment.id)
                .ok_or_else(|| Self::invalid_path(path, format!("no {} {}", segment.model_type, segment.id)))?;
        }
        Ok(ModelRef::Node(owner))
    }

    /// Makes every element along `path` owned by `context`.
    ///
    /// Inherited nodes on the way are replaced by owned copies whose
    /// `reference` is the inherited node. An inherited attribute at the end
    /// is replaced by a copy whose `reference` is the inherited attribute and
    /// whose baseline is the inherited current value. Elements already owned
    /// are returned as they are. Inheritors of the changed owners that still
    /// shared the replaced entry are switched to the copy.
    pub fn copy_from_path(&mut self, path: &ModelPath, context: NodeId) -> ModelResult<PathResolution> {
        self.check_root(path, context)?;
        let mut owner = context;
        let mut replaced = Vec::new();
        let segments = path.segments();

        for (position, segment) in segments.iter().enumerate().skip(1) {
            if segment.model_type == ModelType::Attribute {
                if position + 1 != segments.len() {
                    return Err(Self::invalid_path(path, "attribute must be the last segment"));
                }
                let current = self
                    .attribute_of(owner, &segment.id)
                    .ok_or_else(|| Self::invalid_path(path, format!("no attribute {}", segment.id)))?;
                if self.attribute(current).parent() == owner {
                    return Ok(PathResolution {
                        target: ModelRef::Attribute(current),
                        replaced,
                    });
                }

                let copy = ModelAttribute::copy_from_reference(self.attribute(current), current, owner);
                let copied = AttributeId::from_index(self.attributes.len());
                self.node_mut(owner)
                    .attributes_mut()?
                    .insert_keyed(segment.id.clone(), copied)?;
                self.attributes.push(copy);
                debug!(
                    model = self.node(context).id(),
                    attribute = %segment.id,
                    "overrode inherited attribute"
                );

                let replacement = Replacement {
                    owner,
                    model_type: ModelType::Attribute,
                    key: segment.id.clone(),
                    previous: ModelRef::Attribute(current),
                    current: ModelRef::Attribute(copied),
                };
                self.propagate(&replacement);
                replaced.push(replacement);
                return Ok(PathResolution {
                    target: ModelRef::Attribute(copied),
                    replaced,
                });
            }

            let current = self
                .child(owner, segment.model_type, &segment.id)
                .ok_or_else(|| Self::invalid_path(path, format!("no {} {}", segment.model_type, segment.id)))?;
            if self.node(current).parent() == Some(owner) {
                owner = current;
                continue;
            }

            let copy = self.node(current).override_of(current, owner);
            let copied = NodeId::from_index(self.nodes.len());
            self.node_mut(owner)
                .child_list_mut(segment.model_type)?
                .insert_keyed(segment.id.clone(), copied)?;
            self.nodes.push(copy);
            debug!(
                model = self.node(context).id(),
                model_type = %segment.model_type,
                id = %segment.id,
                "overrode inherited model"
            );

            let replacement = Replacement {
                owner,
                model_type: segment.model_type,
                key: segment.id.clone(),
                previous: ModelRef::Node(current),
                current: ModelRef::Node(copied),
            };
            self.propagate(&replacement);
            replaced.push(replacement);
            owner = copied;
        }

        Ok(PathResolution {
            target: ModelRef::Node(owner),
            replaced,
        })
    }

    /// Removes the override at the end of `path` and puts the element it
    /// references back in its place.
    ///
    /// Fails with [`ModelError::NotOverridden`] when the element is
    /// inherited or owned without a reference.
    pub fn restore_from_path(&mut self, path: &ModelPath, context: NodeId) -> ModelResult<PathResolution> {
        self.check_root(path, context)?;
        let Some(last) = path.last() else {
            return Err(Self::invalid_path(path, "empty path"));
        };
        if path.len() < 2 {
            return Err(Self::invalid_path(path, "a top-level model cannot be restored"));
        }
        let owner = self
            .resolve_path(&path.cut_off_tail(), context)?
            .as_node()
            .ok_or_else(|| Self::invalid_path(path, "attribute must be the last segment"))?;
        if self.owning_model(owner) != context {
            return Err(ModelError::NotOverridden(path.to_string()));
        }

        let (previous, restored) = if last.model_type == ModelType::Attribute {
            let current = self
                .attribute_of(owner, &last.id)
                .ok_or_else(|| Self::invalid_path(path, format!("no attribute {}", last.id)))?;
            let attribute = self.attribute(current);
            let reference = attribute
                .reference()
                .filter(|_| attribute.parent() == owner)
                .ok_or_else(|| ModelError::NotOverridden(path.to_string()))?;
            self.node_mut(owner)
                .attributes_mut()?
                .insert_keyed(last.id.clone(), reference)?;
            (ModelRef::Attribute(current), ModelRef::Attribute(reference))
        } else {
            let current = self
                .child(owner, last.model_type, &last.id)
                .ok_or_else(|| Self::invalid_path(path, format!("no {} {}", last.model_type, last.id)))?;
            let node = self.node(current);
            let reference = node
                .reference()
                .filter(|_| node.parent() == Some(owner))
                .ok_or_else(|| ModelError::NotOverridden(path.to_string()))?;
            self.node_mut(owner)
                .child_list_mut(last.model_type)?
                .insert_keyed(last.id.clone(), reference)?;
            (ModelRef::Node(current), ModelRef::Node(reference))
        };

        debug!(
            model = self.node(context).id(),
            model_type = %last.model_type,
            id = %last.id,
            "restored inherited model"
        );
        let replacement = Replacement {
            owner,
            model_type: last.model_type,
            key: last.id.clone(),
            previous,
            current: restored,
        };
        self.propagate(&replacement);
        Ok(PathResolution {
            target: restored,
            replaced: vec![replacement],
        })
    }

    /// Puts `replacement.previous` back where `replacement.current` is.
    pub fn undo_replacement(&mut self, replacement: &Replacement) -> ModelResult<()> {
        self.set_entry(
            replacement.owner,
            replacement.model_type,
            &replacement.key,
            replacement.previous,
        )?;
        self.propagate(&Replacement {
            owner: replacement.owner,
            model_type: replacement.model_type,
            key: replacement.key.clone(),
            previous: replacement.current,
            current: replacement.previous,
        });
        Ok(())
    }

    /// Models inheriting the collections of `node`: child definitions for a
    /// top-level model, attached overrides of `node` otherwise.
    fn inheritors(&self, node: NodeId) -> Vec<NodeId> {
        if self.node(node).model_type().is_top_level() {
            return self.node(node).children().to_vec();
        }
        (0..self.nodes.len())
            .map(NodeId::from_index)
            .filter(|&candidate| self.node(candidate).reference() == Some(node) && self.is_attached(candidate))
            .collect()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let model = self.node(node);
        match model.parent() {
            Some(owner) if !model.model_type().is_top_level() => {
                self.child(owner, model.model_type(), model.id()) == Some(node)
            }
            _ => true,
        }
    }

    fn entry(&self, node: NodeId, model_type: ModelType, key: &str) -> Option<ModelRef> {
        if model_type == ModelType::Attribute {
            return self.attribute_of(node, key).map(ModelRef::Attribute);
        }
        self.child(node, model_type, key).map(ModelRef::Node)
    }

    fn set_entry(&mut self, node: NodeId, model_type: ModelType, key: &str, value: ModelRef) -> ModelResult<()> {
        match value {
            ModelRef::Attribute(attribute) if model_type == ModelType::Attribute => {
                self.node_mut(node).attributes_mut()?.insert_keyed(key, attribute)?;
            }
            ModelRef::Node(child) if model_type != ModelType::Attribute => {
                self.node_mut(node).child_list_mut(model_type)?.insert_keyed(key, child)?;
            }
            _ => {
                return Err(ModelError::InvalidChild {
                    model: self.node(node).id().to_string(),
                    child: format!("{model_type} {key}"),
                });
            }
        }
        Ok(())
    }

    fn reference_of(&self, target: ModelRef) -> Option<ModelRef> {
        match target {
            ModelRef::Node(node) => self.node(node).reference().map(ModelRef::Node),
            ModelRef::Attribute(attribute) => self.attribute(attribute).reference().map(ModelRef::Attribute),
        }
    }

    fn set_reference_of(&mut self, target: ModelRef, reference: ModelRef) {
        match (target, reference) {
            (ModelRef::Node(node), ModelRef::Node(reference)) => {
                self.node_mut(node).set_reference(Some(reference));
            }
            (ModelRef::Attribute(attribute), ModelRef::Attribute(reference)) => {
                self.attribute_mut(attribute).set_reference(Some(reference));
            }
            _ => {}
        }
    }

    /// Carries a replacement down to the models inheriting from its owner.
    ///
    /// An inheritor still sharing the previous entry gets the new one and
    /// passes it on. An inheritor with its own override of the previous
    /// entry keeps the override and re-points its reference.
    fn propagate(&mut self, replacement: &Replacement) {
        let mut pending = self.inheritors(replacement.owner);
        while let Some(inheritor) = pending.pop() {
            let Some(entry) = self.entry(inheritor, replacement.model_type, &replacement.key) else {
                continue;
            };
            if entry == replacement.previous {
                if let Err(error) = self.set_entry(inheritor, replacement.model_type, &replacement.key, replacement.current) {
                    warn!(
                        %error,
                        model = self.node(inheritor).id(),
                        "inheritor keeps the previous entry"
                    );
                    continue;
                }
                pending.extend(self.inheritors(inheritor));
            } else if self.reference_of(entry) == Some(replacement.previous) {
                self.set_reference_of(entry, replacement.current);
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Accepts every current value as the new baseline.
    pub fn commit(&mut self) {
        for attribute in &mut self.attributes {
            attribute.commit();
        }
    }

    /// Accepts the current value of one attribute as its baseline.
    pub fn commit_attribute(&mut self, attribute: AttributeId) {
        self.attribute_mut(attribute).commit();
    }

    /// Resets every attribute owned by `node`, recursively, to its baseline.
    pub fn restore_model(&mut self, node: NodeId) -> ModelResult<()> {
        for attribute in self.owned_attributes(node) {
            self.attribute_mut(attribute).restore_attribute()?;
        }
        for child in self.owned_children(node) {
            self.restore_model(child)?;
        }
        Ok(())
    }

    /// Freezes a model together with everything it owns.
    pub fn seal_model(&mut self, node: NodeId) {
        for attribute in self.owned_attributes(node) {
            self.attribute_mut(attribute).seal();
        }
        for child in self.owned_children(node) {
            self.seal_model(child);
        }
        self.node_mut(node).seal();
    }

    // ── Descriptions ─────────────────────────────────────────────

    fn label_attribute(&self, node: NodeId) -> Option<&ModelAttribute> {
        LABEL_ATTRIBUTES
            .iter()
            .find_map(|name| self.attribute_of(node, name))
            .map(|attribute| self.attribute(attribute))
    }

    /// Localized display name of a model.
    ///
    /// Uses the label attribute once the model is loaded and the hierarchy
    /// labels before that, then falls back to the identifier.
    pub fn description(&self, node: NodeId, languages: &LanguagePreference) -> String {
        if let Some(AttributeValue::Multi(values)) = self.label_attribute(node).map(ModelAttribute::value) {
            let found = languages.resolve(|language| {
                values
                    .get_model(language.as_str())
                    .and_then(|value| value.value().as_str())
                    .filter(|text| !text.is_empty())
            });
            if let Some(text) = found {
                return text.to_string();
            }
        }
        let model = self.node(node);
        languages.describe(model.labels(), model.id())
    }

    /// Display name in exactly one language, without fallback.
    pub fn description_by_language(&self, node: NodeId, language: &Language) -> Option<String> {
        if let Some(attribute) = self.label_attribute(node) {
            if let Some(text) = attribute
                .value_by_language(language)
                .and_then(|value| value.value().as_str())
                .filter(|text| !text.is_empty())
            {
                return Some(text.to_string());
            }
        }
        self.node(node).labels().get(language).cloned()
    }

    /// Attributes created by copy-on-write that are still attached.
    pub fn overrides(&self, node: NodeId) -> Vec<AttributeId> {
        self.owned_attributes(node)
            .into_iter()
            .filter(|&attribute| self.attribute(attribute).source() == AttributeSource::Copy)
            .collect()
    }
}
