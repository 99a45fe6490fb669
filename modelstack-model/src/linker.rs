use crate::attribute::ModelAttribute;
use crate::error::ModelResult;
use crate::meta::ModelsMetaData;
use crate::node::{ModelNode, ModelType};
use crate::payload::{AttributePayload, ModelPayload};
use crate::tree::ModelTree;
use modelstack_types::{Language, NodeId};
use std::collections::BTreeMap;
use tracing::debug;

/// Fills shell nodes from model data and attaches metadata.
///
/// A node inherits from its source: the inheritance parent for top-level
/// models, the overridden node for nested ones. Collections start as shallow
/// copies of the source's, then the node's own entries are inserted over
/// them, so an override keeps the position of what it overrides.
pub struct ModelLinker<'a> {
    meta: &'a ModelsMetaData,
}

impl<'a> ModelLinker<'a> {
    pub fn new(meta: &'a ModelsMetaData) -> Self {
        Self { meta }
    }

    /// Links a top-level model. Its ancestors must be linked first.
    pub fn link_model(&self, tree: &mut ModelTree, node: NodeId, payload: &ModelPayload) -> ModelResult<()> {
        let source = tree.node(node).parent();
        self.link_node(tree, node, source, payload)?;
        debug!(
            model = %payload.id,
            attributes = tree.node(node).attributes().size(),
            "linked model"
        );
        Ok(())
    }

    /// Creates and links a semantic property.
    pub fn link_property(&self, tree: &mut ModelTree, payload: &ModelPayload) -> ModelResult<NodeId> {
        let node = match tree.get_property(&payload.id) {
            Some(existing) => existing,
            None => tree.create_node(&payload.id, ModelType::Property, None)?,
        };
        self.link_node(tree, node, None, payload)?;
        Ok(node)
    }

    fn link_node(
        &self,
        tree: &mut ModelTree,
        node: NodeId,
        source: Option<NodeId>,
        payload: &ModelPayload,
    ) -> ModelResult<()> {
        self.link_attributes(tree, node, source, &payload.attributes)?;
        self.link_children(tree, node, source, payload)?;
        let model = tree.node_mut(node);
        set_labels(model, &payload.labels)?;
        model.set_loaded(true);
        Ok(())
    }

    fn link_attributes(
        &self,
        tree: &mut ModelTree,
        node: NodeId,
        source: Option<NodeId>,
        attributes: &[AttributePayload],
    ) -> ModelResult<()> {
        let model_type = tree.node(node).model_type();
        if let Some(source) = source {
            let inherited = tree.node(source).attributes().unsealed_copy();
            tree.node_mut(node).attributes_mut()?.copy_from(&inherited)?;
        }

        for payload in attributes {
            let meta = self.meta.get(model_type, &payload.name).cloned();
            let kind = match (&meta, payload.kind.is_empty()) {
                (Some(meta), true) => meta.kind.clone(),
                _ => payload.kind.clone(),
            };
            let mut attribute = ModelAttribute::from_json(&payload.name, kind, node, payload.value.clone())?;
            if let Some(meta) = meta {
                attribute.set_meta(meta);
            }
            attribute.set_reference(source.and_then(|source| tree.attribute_of(source, &payload.name)));
            let attribute = tree.add_attribute(attribute);
            tree.set_attribute(node, attribute)?;
        }

        // attributes described by metadata but missing from the payload and
        // from every ancestor start at their default value
        if let Some(described) = self.meta.for_type(model_type) {
            for (name, meta) in described.iter() {
                if tree.node(node).attributes().has_model(name) {
                    continue;
                }
                let attribute = ModelAttribute::from_meta(meta.clone(), name, node)?;
                let attribute = tree.add_attribute(attribute);
                tree.set_attribute(node, attribute)?;
            }
        }
        Ok(())
    }

    fn link_children(
        &self,
        tree: &mut ModelTree,
        node: NodeId,
        source: Option<NodeId>,
        payload: &ModelPayload,
    ) -> ModelResult<()> {
        let child_types = tree.node(node).kind().child_types();
        for &child_type in child_types {
            if let Some(inherited) = source.and_then(|source| tree.node(source).child_list(child_type)) {
                let inherited = inherited.unsealed_copy();
                tree.node_mut(node).child_list_mut(child_type)?.copy_from(&inherited)?;
            }

            for child_payload in payload.children(child_type) {
                let inherited = source.and_then(|source| tree.child(source, child_type, &child_payload.id));
                let child = tree.create_node(&child_payload.id, child_type, Some(node))?;
                let region = child_payload.region_id.clone().or_else(|| {
                    inherited.and_then(|inherited| tree.node(inherited).region_id().map(str::to_string))
                });
                let model = tree.node_mut(child);
                model.set_reference(inherited);
                model.set_region_id(region);
                tree.add_child(node, child)?;
                self.link_node(tree, child, inherited, child_payload)?;
            }
        }
        Ok(())
    }
}

fn set_labels(model: &mut ModelNode, labels: &BTreeMap<String, String>) -> ModelResult<()> {
    for (code, label) in labels {
        model.set_label(Language::parse(code)?, label);
    }
    Ok(())
}
