//! Error types for edit actions.

use modelstack_model::ModelError;
use thiserror::Error;

/// Result type for action operations.
pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    /// The tree refused the change: sealed, read-only, not overridden, ...
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A handle that was not issued by the tree the action runs on.
    #[error("unknown handle: {0}")]
    UnknownHandle(String),

    /// The action context is not a class, definition or property.
    #[error("{0} is not a top-level model")]
    InvalidContext(String),

    /// The executed action does not carry what the operation needs.
    #[error("inconsistent executed action: {0}")]
    Inconsistent(String),

    /// Resetting an inherited value would change the model it is inherited from.
    #[error("attribute {attribute} is not owned by {context}")]
    NotOwned { attribute: String, context: String },
}
