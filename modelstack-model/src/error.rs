//! Error types for the model tree.

use modelstack_rules::RuleError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the model tree.
///
/// Everything except `Rule` and `Serialization` is a structural violation:
/// the caller asked for something the tree cannot do without corrupting the
/// inheritance chain.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A sealed list, node or attribute was asked to change.
    #[error("{0} is sealed")]
    Sealed(String),

    #[error("model not found: {0}")]
    NotFound(String),

    /// The attribute is read-only and already holds a value.
    #[error("attribute {attribute} of {model} is not updateable")]
    NotUpdateable { model: String, attribute: String },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{child} cannot be a child of {model}")]
    InvalidChild { model: String, child: String },

    /// Restoring an inherited model that does not override anything.
    #[error("{0} does not override an inherited model")]
    NotOverridden(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Types(#[from] modelstack_types::Error),
}
