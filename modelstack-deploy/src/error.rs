//! Error types for the management and deployment layer.

use crate::service::ValidationReport;
use modelstack_actions::ActionError;
use modelstack_model::ModelError;
use modelstack_types::ModelVersion;
use thiserror::Error;

/// Result type for management and deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that can occur while loading, saving or deploying models.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Structural violation in the model tree.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An edit could not be applied.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The requested model is neither cached nor known to the service.
    #[error("model not found: {0}")]
    NotFound(String),

    /// A model with this identifier already exists.
    #[error("model already exists: {0}")]
    DuplicateModel(String),

    /// The server holds a newer version than the session.
    #[error("version conflict: session is at {local}, server is at {server}")]
    VersionConflict {
        local: ModelVersion,
        server: ModelVersion,
    },

    /// The service refused the change and reported why.
    #[error("rejected by the models service: {0}")]
    Rejected(ValidationReport),

    /// Transport or server failure.
    #[error("models service error: {0}")]
    Service(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
