//! Core type definitions for ModelStack.
//!
//! This crate defines the small, domain-agnostic types shared by every layer
//! of the model management engine:
//! - Arena handles for model nodes and attributes
//! - Deployment session identifiers (UUID v7)
//! - Language codes used by localized values and descriptions
//! - The optimistic-concurrency model version
//!
//! Everything that knows what a definition, field or attribute *is* belongs
//! in `modelstack-model`, not here.

mod ids;
mod language;
mod version;

pub use ids::{AttributeId, DeploymentId, NodeId};
pub use language::Language;
pub use version::ModelVersion;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),
}
