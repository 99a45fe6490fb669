//! Class and definition hierarchy.
//!
//! Built from the hierarchy payload before any model data is loaded: every
//! class and definition gets a shell node carrying its labels, its
//! inheritance parent and, for definitions, its class.

use crate::error::ModelResult;
use crate::node::ModelType;
use crate::payload::HierarchyEntry;
use crate::tree::ModelTree;
use modelstack_types::{Language, NodeId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A node of the hierarchy tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyItem {
    pub root: NodeId,
    pub children: Vec<HierarchyItem>,
}

/// The hierarchy as a tree of classes and as a flat id index.
///
/// Classes nest under their parent class. A definition nests under its
/// parent definition when both belong to the same class, otherwise directly
/// under its class. Within a class, definitions come before sub classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelHierarchy {
    pub tree: Vec<HierarchyItem>,
    pub flat: BTreeMap<String, NodeId>,
}

struct Placed<'a> {
    entry: &'a HierarchyEntry,
    node: NodeId,
    class: Option<NodeId>,
}

impl ModelHierarchy {
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.flat.get(id).copied()
    }

    /// Creates shell nodes for every entry and links them.
    pub fn build(tree: &mut ModelTree, entries: &[HierarchyEntry]) -> ModelResult<Self> {
        let mut flat = BTreeMap::new();
        let mut classes = Vec::new();
        let mut definitions = Vec::new();

        for entry in entries {
            let node = Self::create(tree, entry, ModelType::Class)?;
            flat.insert(entry.id.clone(), node);
            classes.push(Placed {
                entry,
                node,
                class: None,
            });
        }
        for class in &classes {
            for entry in &class.entry.sub_types {
                if flat.contains_key(&entry.id) {
                    warn!(id = %entry.id, "duplicate hierarchy entry");
                    continue;
                }
                let node = Self::create(tree, entry, ModelType::Definition)?;
                tree.node_mut(node).set_class(class.node);
                flat.insert(entry.id.clone(), node);
                definitions.push(Placed {
                    entry,
                    node,
                    class: Some(class.node),
                });
            }
        }

        for placed in classes.iter().chain(&definitions) {
            let Some(parent_id) = &placed.entry.parent_id else {
                continue;
            };
            match flat.get(parent_id) {
                Some(&parent) if parent == placed.node || tree.ancestors(parent).contains(&placed.node) => {
                    warn!(id = %placed.entry.id, parent = %parent_id, "inheritance cycle in hierarchy");
                }
                Some(&parent) => tree.link_parent(placed.node, parent),
                None => warn!(id = %placed.entry.id, parent = %parent_id, "unknown hierarchy parent"),
            }
        }

        let roots = classes
            .iter()
            .filter(|class| tree.node(class.node).parent().is_none())
            .map(|class| Self::class_item(tree, class.node, &classes, &definitions))
            .collect();
        debug!(
            classes = classes.len(),
            definitions = definitions.len(),
            "built model hierarchy"
        );
        Ok(Self { tree: roots, flat })
    }

    fn create(tree: &mut ModelTree, entry: &HierarchyEntry, model_type: ModelType) -> ModelResult<NodeId> {
        let node = tree.create_node(&entry.id, model_type, None)?;
        let model = tree.node_mut(node);
        model.set_abstract(entry.is_abstract);
        for (code, label) in &entry.labels {
            model.set_label(Language::parse(code)?, label);
        }
        Ok(node)
    }

    fn class_item(tree: &ModelTree, class: NodeId, classes: &[Placed<'_>], definitions: &[Placed<'_>]) -> HierarchyItem {
        let direct_definitions = definitions.iter().filter(|definition| {
            definition.class == Some(class)
                && tree
                    .node(definition.node)
                    .parent()
                    .is_none_or(|parent| tree.node(parent).class() != Some(class))
        });
        let mut children: Vec<HierarchyItem> = direct_definitions
            .map(|definition| Self::definition_item(tree, definition.node, class, definitions))
            .collect();
        children.extend(
            classes
                .iter()
                .filter(|sub| tree.node(sub.node).parent() == Some(class))
                .map(|sub| Self::class_item(tree, sub.node, classes, definitions)),
        );
        HierarchyItem {
            root: class,
            children,
        }
    }

    fn definition_item(tree: &ModelTree, definition: NodeId, class: NodeId, definitions: &[Placed<'_>]) -> HierarchyItem {
        let children = definitions
            .iter()
            .filter(|child| child.class == Some(class) && tree.node(child.node).parent() == Some(definition))
            .map(|child| Self::definition_item(tree, child.node, class, definitions))
            .collect();
        HierarchyItem {
            root: definition,
            children,
        }
    }
}
