//! Model tree for ModelStack.
//!
//! The in-memory representation of hierarchical, inheritable model
//! definitions and the operations the administration console edits them
//! with:
//! - [`ModelList`]: ordered keyed collection backing every child collection
//! - [`ModelValue`] / [`ModelAttribute`]: values with a baseline and dirty state
//! - [`ModelTree`] / [`ModelNode`] / [`ModelKind`]: the arena of entities
//! - [`ModelHierarchy`] and [`ModelLinker`]: building the tree from payloads
//! - [`ModelPath`] and [`ChangeSetBuilder`]: addressing and diffing attributes
//! - [`AttributeValidator`]: mandatory and rule-driven validation
//!
//! The tree is mutated synchronously. Network access lives in
//! `modelstack-deploy`.

mod attribute;
mod changeset;
mod description;
mod error;
mod hierarchy;
mod linker;
mod list;
mod meta;
mod node;
mod path;
mod payload;
mod tree;
mod validation;
mod value;

pub use attribute::{
    AttributeRestrictions, AttributeSource, AttributeValidation, ModelAttribute, ValidationError,
    ValidationErrorKind,
};
pub use changeset::{ChangeSetBuilder, ModelChangeSet, ModelOperation};
pub use description::LanguagePreference;
pub use error::{ModelError, ModelResult};
pub use hierarchy::{HierarchyItem, ModelHierarchy};
pub use linker::ModelLinker;
pub use list::{Identified, ModelList, Sealable};
pub use meta::{
    MULTI_LANGUAGE_TYPES, MetaDataBuilder, MetaDataList, ModelMetaData, ModelsMetaData, ValidationModel,
    is_multi_language,
};
pub use node::{ModelKind, ModelNode, ModelType};
pub use path::{ModelPath, PathSegment};
pub use payload::{AttributePayload, HierarchyEntry, MetaDataPayload, ModelDataPayload, ModelPayload};
pub use tree::{LABEL_ATTRIBUTES, ModelRef, ModelTree, PathResolution, Replacement};
pub use validation::{AttributeValidator, MANDATORY_LABEL, RULE_LABEL};
pub use value::{AttributeValue, ModelValue};
