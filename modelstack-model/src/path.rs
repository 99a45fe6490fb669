use crate::error::{ModelError, ModelResult};
use crate::node::ModelType;
use crate::tree::{ModelRef, ModelTree};
use modelstack_types::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One `(id, type)` step of a model path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
}

impl PathSegment {
    pub fn new(id: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            id: id.into(),
            model_type,
        }
    }
}

/// Address of a model element, from a top-level model down to the element.
///
/// The text form is `definition=PR0001/field=title/attribute=displayType`;
/// identifiers are percent-encoded so URIs survive the round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelPath(Vec<PathSegment>);

impl ModelPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment.
    pub fn with(mut self, id: impl Into<String>, model_type: ModelType) -> Self {
        self.0.push(PathSegment::new(id, model_type));
        self
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path without its last segment.
    pub fn cut_off_tail(&self) -> Self {
        let end = self.0.len().saturating_sub(1);
        Self(self.0[..end].to_vec())
    }

    /// Structural chain from the top-level model down to `node`.
    fn chain(tree: &ModelTree, node: NodeId) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let model = tree.node(id);
            segments.push(PathSegment::new(model.id(), model.model_type()));
            if model.model_type().is_top_level() {
                break;
            }
            current = model.parent();
        }
        segments.reverse();
        segments
    }

    fn reroot(mut segments: Vec<PathSegment>, tree: &ModelTree, context: NodeId) -> ModelResult<Self> {
        let root = tree.node(context);
        if !root.model_type().is_top_level() {
            return Err(ModelError::InvalidPath {
                path: Self(segments).to_string(),
                reason: format!("context {} is not a top-level model", root.id()),
            });
        }
        if let Some(first) = segments.first_mut() {
            *first = PathSegment::new(root.id(), root.model_type());
        }
        Ok(Self(segments))
    }

    /// Path of a node as seen from `context`.
    ///
    /// The node may be inherited: the structural chain is computed from
    /// wherever the node lives and then re-rooted at the context. A
    /// top-level node is its own path.
    pub fn for_node(tree: &ModelTree, node: NodeId, context: NodeId) -> ModelResult<Self> {
        if tree.node(node).model_type().is_top_level() {
            let model = tree.node(node);
            return Ok(Self::new().with(model.id(), model.model_type()));
        }
        Self::reroot(Self::chain(tree, node), tree, context)
    }

    /// Path of an attribute as seen from `context`.
    pub fn for_attribute(tree: &ModelTree, attribute: AttributeId, context: NodeId) -> ModelResult<Self> {
        let attribute = tree.attribute(attribute);
        let mut segments = Self::chain(tree, attribute.parent());
        segments.push(PathSegment::new(attribute.id(), ModelType::Attribute));
        Self::reroot(segments, tree, context)
    }

    /// Resolves the path against the tree's top-level models.
    pub fn walk(&self, tree: &ModelTree) -> ModelResult<ModelRef> {
        let root = self.first().ok_or_else(|| ModelError::InvalidPath {
            path: String::new(),
            reason: "empty path".to_string(),
        })?;
        let context = match root.model_type {
            ModelType::Property => tree.get_property(&root.id),
            _ => tree.get_model(&root.id),
        }
        .ok_or_else(|| ModelError::NotFound(root.id.clone()))?;
        tree.resolve_path(self, context)
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}={}", segment.model_type, urlencoding::encode(&segment.id))?;
        }
        Ok(())
    }
}

impl FromStr for ModelPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ModelError::InvalidPath {
            path: s.to_string(),
            reason,
        };
        if s.trim().is_empty() {
            return Err(invalid("empty path".to_string()));
        }
        let mut path = Self::new();
        for part in s.split('/') {
            let (model_type, id) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("segment {part:?} is not type=id")))?;
            let model_type: ModelType = model_type.parse()?;
            let id = urlencoding::decode(id).map_err(|e| invalid(e.to_string()))?;
            if id.is_empty() {
                return Err(invalid(format!("segment {part:?} has no id")));
            }
            path.push(PathSegment::new(id.into_owned(), model_type));
        }
        Ok(path)
    }
}
