//! A [`ModelsService`] over a directory of JSON files.
//!
//! Layout of the fixtures directory:
//!
//! ```text
//! metadata.json        MetaDataPayload
//! hierarchy.json       [HierarchyEntry]
//! properties.json      [ModelPayload]          (optional)
//! deploy.json          ModelsForDeploy         (optional)
//! models/<id>.json     ModelDataPayload, one per model id
//! state.json           written by the console: version, saves, deployments
//! ```
//!
//! Saved change-sets are appended to `state.json`; the model files are
//! never rewritten.

use async_trait::async_trait;
use modelstack_deploy::{
    DeployError, DeployRequest, DeployResponse, DeployResult, ModelsForDeploy, ModelsService, SaveResponse,
};
use modelstack_model::{HierarchyEntry, MetaDataPayload, ModelChangeSet, ModelDataPayload, ModelPayload};
use modelstack_types::ModelVersion;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const STATE_FILE: &str = "state.json";

/// What the console has sent so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerState {
    pub model_version: ModelVersion,
    pub saved: Vec<ModelChangeSet>,
    pub deployed: Vec<DeployRequest>,
}

pub struct FileModelsService {
    root: PathBuf,
    state: Mutex<ServerState>,
}

impl FileModelsService {
    /// Opens the fixtures directory and restores the state of earlier runs.
    pub async fn open(root: impl Into<PathBuf>) -> DeployResult<Self> {
        let root = root.into();
        if !tokio::fs::metadata(&root).await.is_ok_and(|m| m.is_dir()) {
            return Err(DeployError::NotFound(root.display().to_string()));
        }
        let state = read_optional::<ServerState>(&root.join(STATE_FILE)).await?;
        debug!(root = %root.display(), version = %state.model_version, "opened fixtures");
        Ok(Self {
            root,
            state: Mutex::new(state),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn version(&self) -> ModelVersion {
        self.state.lock().await.model_version
    }

    pub async fn state(&self) -> ServerState {
        self.state.lock().await.clone()
    }

    fn model_file(&self, id: &str) -> PathBuf {
        self.root.join("models").join(format!("{}.json", urlencoding::encode(id)))
    }

    async fn persist(&self, state: &ServerState) -> DeployResult<()> {
        let path = self.root.join(STATE_FILE);
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&path, json).await.map_err(|e| io_error(&path, e))
    }

    /// Checks `version` against the stored one and moves it forward.
    fn next_version(state: &mut ServerState, version: ModelVersion) -> DeployResult<ModelVersion> {
        if version != state.model_version {
            return Err(DeployError::VersionConflict {
                local: version,
                server: state.model_version,
            });
        }
        let next = ModelVersion::new(state.model_version.value() + 1);
        state.model_version = next;
        Ok(next)
    }
}

fn io_error(path: &Path, error: std::io::Error) -> DeployError {
    match error.kind() {
        ErrorKind::NotFound => DeployError::NotFound(path.display().to_string()),
        _ => DeployError::Service(format!("{}: {}", path.display(), error)),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> DeployResult<T> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> DeployResult<T> {
    match read_json(path).await {
        Err(DeployError::NotFound(_)) => Ok(T::default()),
        other => other,
    }
}

#[async_trait]
impl ModelsService for FileModelsService {
    async fn get_meta_data(&self) -> DeployResult<MetaDataPayload> {
        read_json(&self.root.join("metadata.json")).await
    }

    async fn get_hierarchy(&self) -> DeployResult<Vec<HierarchyEntry>> {
        read_json(&self.root.join("hierarchy.json")).await
    }

    async fn get_model_data(&self, id: &str) -> DeployResult<ModelDataPayload> {
        match read_json(&self.model_file(id)).await {
            Err(DeployError::NotFound(_)) => Err(DeployError::NotFound(id.to_string())),
            other => other,
        }
    }

    async fn get_properties(&self) -> DeployResult<Vec<ModelPayload>> {
        read_optional(&self.root.join("properties.json")).await
    }

    async fn save_models(&self, change_sets: &[ModelChangeSet], version: ModelVersion) -> DeployResult<SaveResponse> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let model_version = Self::next_version(&mut next, version)?;
        next.saved.extend_from_slice(change_sets);
        self.persist(&next).await?;
        *state = next;
        info!(changes = change_sets.len(), version = %model_version, "stored change-sets");
        Ok(SaveResponse { model_version })
    }

    async fn get_models_for_deploy(&self, ids: &[String]) -> DeployResult<ModelsForDeploy> {
        let available: ModelsForDeploy = read_optional(&self.root.join("deploy.json")).await?;
        debug!(requested = ids.len(), available = available.models.len(), "read deployable models");
        Ok(available)
    }

    async fn deploy_models(&self, request: &DeployRequest) -> DeployResult<DeployResponse> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let model_version = Self::next_version(&mut next, request.version)?;
        next.deployed.push(request.clone());
        self.persist(&next).await?;
        *state = next;
        info!(models = request.models_to_deploy.len(), version = %model_version, "recorded deployment");
        Ok(DeployResponse {
            model_version,
            deployed: request.models_to_deploy.clone(),
        })
    }
}
