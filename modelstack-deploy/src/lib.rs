//! Loading, saving and deploying models for ModelStack.
//!
//! The engine talks to the server only through [`ModelsService`]:
//!
//! - [`ModelManagementService`] caches metadata, the hierarchy and linked
//!   models, applies edits and saves them under optimistic versioning
//! - [`DeployCoordinator`] runs the select-then-deploy dialog, one
//!   deployment at a time
//! - [`EventBus`] carries [`ModelEvent`]s between the console and both
//!
//! # Example
//!
//! ```
//! use modelstack_deploy::{EventBus, Load, ManagementConfig, ModelManagementService};
//! use modelstack_deploy::mock::MockModelsService;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let service = Arc::new(MockModelsService::new());
//! let mut management = ModelManagementService::new(service, ManagementConfig::default(), EventBus::default());
//! let models = management.get_models(Load::Cached).await.unwrap();
//! assert!(models.is_empty());
//! # });
//! ```

mod config;
mod coordinator;
mod error;
mod events;
mod management;
pub mod mock;
mod service;

pub use config::ManagementConfig;
pub use coordinator::{
    DeployCoordinator, DeployDialog, DeployOutcome, DeployState, DialogOutcome, ModelDeployRequest, Notifier,
};
pub use error::{DeployError, DeployResult};
pub use events::{EventBus, ModelEvent};
pub use management::{Load, ModelManagementService};
pub use service::{
    DeployRequest, DeployResponse, DeployableModel, ModelsForDeploy, ModelsService, SaveResponse, ValidationReport,
};
