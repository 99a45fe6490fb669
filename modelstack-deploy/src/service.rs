//! The models service boundary.
//!
//! Everything the engine needs from the server goes through [`ModelsService`].
//! These are the only suspension points: the tree itself is never touched
//! while a request is in flight.

use crate::error::DeployResult;
use async_trait::async_trait;
use modelstack_model::{HierarchyEntry, Identified, MetaDataPayload, ModelChangeSet, ModelDataPayload, ModelPayload};
use modelstack_types::{Language, ModelVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reply to a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub model_version: ModelVersion,
}

/// Acknowledgement of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub model_version: ModelVersion,
    #[serde(default)]
    pub deployed: Vec<String>,
}

/// A model the server can publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployableModel {
    pub id: String,
    #[serde(default)]
    pub labels: BTreeMap<Language, String>,
}

impl DeployableModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, language: Language, label: impl Into<String>) -> Self {
        self.labels.insert(language, label.into());
        self
    }
}

impl Identified for DeployableModel {
    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Server-side validation of the models to deploy, keyed by model id.
///
/// A model without entries is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    pub fn is_model_valid(&self, id: &str) -> bool {
        self.errors.get(id).is_none_or(Vec::is_empty)
    }

    pub fn errors_for(&self, id: &str) -> &[String] {
        self.errors.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn add_error(&mut self, id: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(id.into()).or_default().push(message.into());
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let invalid = self.errors.values().filter(|errors| !errors.is_empty()).count();
        write!(f, "{invalid} invalid model(s)")
    }
}

/// Deployable models plus their validation, as returned for the dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsForDeploy {
    pub models: Vec<DeployableModel>,
    #[serde(default)]
    pub validation_report: ValidationReport,
}

/// What is sent to publish models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub models_to_deploy: Vec<String>,
    pub version: ModelVersion,
}

/// The server holding the models.
#[async_trait]
pub trait ModelsService: Send + Sync {
    /// Metadata describing every attribute of every model type.
    async fn get_meta_data(&self) -> DeployResult<MetaDataPayload>;

    /// Classes with their definitions.
    async fn get_hierarchy(&self) -> DeployResult<Vec<HierarchyEntry>>;

    /// A model together with its ancestors.
    async fn get_model_data(&self, id: &str) -> DeployResult<ModelDataPayload>;

    /// Semantic properties.
    async fn get_properties(&self) -> DeployResult<Vec<ModelPayload>>;

    /// Persists change-sets made against `version`.
    async fn save_models(&self, change_sets: &[ModelChangeSet], version: ModelVersion) -> DeployResult<SaveResponse>;

    /// Models that can be deployed, with a validation report. An empty
    /// `ids` asks for every deployable model.
    async fn get_models_for_deploy(&self, ids: &[String]) -> DeployResult<ModelsForDeploy>;

    async fn deploy_models(&self, request: &DeployRequest) -> DeployResult<DeployResponse>;
}
