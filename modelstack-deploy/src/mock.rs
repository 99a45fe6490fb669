//! In-memory [`ModelsService`] for tests and offline sessions.
//!
//! Serves fixed payloads, keeps a server-side version that advances on every
//! save and deploy, and counts calls per operation.

use crate::error::{DeployError, DeployResult};
use crate::service::{
    DeployRequest, DeployResponse, DeployableModel, ModelsForDeploy, ModelsService, SaveResponse, ValidationReport,
};
use async_trait::async_trait;
use modelstack_model::{HierarchyEntry, MetaDataPayload, ModelChangeSet, ModelDataPayload, ModelPayload};
use modelstack_types::ModelVersion;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Number of calls made to each operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub meta_data: usize,
    pub hierarchy: usize,
    pub model_data: usize,
    pub properties: usize,
    pub save_models: usize,
    pub models_for_deploy: usize,
    pub deploy_models: usize,
}

#[derive(Debug, Default)]
struct Counters {
    meta_data: AtomicUsize,
    hierarchy: AtomicUsize,
    model_data: AtomicUsize,
    properties: AtomicUsize,
    save_models: AtomicUsize,
    models_for_deploy: AtomicUsize,
    deploy_models: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

#[derive(Debug, Default)]
struct Failures {
    models_for_deploy: bool,
    deploy: bool,
    save_rejection: Option<ValidationReport>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MockModelsService {
    meta: MetaDataPayload,
    hierarchy: Vec<HierarchyEntry>,
    models: HashMap<String, ModelDataPayload>,
    properties: Vec<ModelPayload>,
    deployable: ModelsForDeploy,
    delay: Option<Duration>,
    version: AtomicU64,
    failures: Mutex<Failures>,
    saved: Mutex<Vec<ModelChangeSet>>,
    deployed: Mutex<Vec<DeployRequest>>,
    counters: Counters,
}

impl MockModelsService {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Fixtures ─────────────────────────────────────────────────

    pub fn with_meta_data(mut self, meta: MetaDataPayload) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_hierarchy(mut self, hierarchy: Vec<HierarchyEntry>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Serves `data` when `id` is requested.
    pub fn with_model_data(mut self, id: impl Into<String>, data: ModelDataPayload) -> Self {
        self.models.insert(id.into(), data);
        self
    }

    pub fn with_properties(mut self, properties: Vec<ModelPayload>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_deployable(mut self, models: Vec<DeployableModel>, report: ValidationReport) -> Self {
        self.deployable = ModelsForDeploy {
            models,
            validation_report: report,
        };
        self
    }

    pub fn with_version(self, version: ModelVersion) -> Self {
        self.version.store(version.value(), Ordering::SeqCst);
        self
    }

    /// Makes the deployment calls wait before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    // ── Runtime behaviour ────────────────────────────────────────

    pub fn fail_models_for_deploy(&self, fail: bool) {
        lock(&self.failures).models_for_deploy = fail;
    }

    pub fn fail_deploy(&self, fail: bool) {
        lock(&self.failures).deploy = fail;
    }

    /// Rejects every save with `report` until cleared with `None`.
    pub fn reject_saves(&self, report: Option<ValidationReport>) {
        lock(&self.failures).save_rejection = report;
    }

    /// Moves the server version as another session would.
    pub fn set_server_version(&self, version: ModelVersion) {
        self.version.store(version.value(), Ordering::SeqCst);
    }

    // ── Inspection ───────────────────────────────────────────────

    pub fn server_version(&self) -> ModelVersion {
        ModelVersion::new(self.version.load(Ordering::SeqCst))
    }

    pub fn calls(&self) -> MockCalls {
        let c = &self.counters;
        MockCalls {
            meta_data: c.meta_data.load(Ordering::SeqCst),
            hierarchy: c.hierarchy.load(Ordering::SeqCst),
            model_data: c.model_data.load(Ordering::SeqCst),
            properties: c.properties.load(Ordering::SeqCst),
            save_models: c.save_models.load(Ordering::SeqCst),
            models_for_deploy: c.models_for_deploy.load(Ordering::SeqCst),
            deploy_models: c.deploy_models.load(Ordering::SeqCst),
        }
    }

    /// Every change-set accepted so far.
    pub fn saved(&self) -> Vec<ModelChangeSet> {
        lock(&self.saved).clone()
    }

    pub fn deployed(&self) -> Vec<DeployRequest> {
        lock(&self.deployed).clone()
    }

    fn check_version(&self, version: ModelVersion) -> DeployResult<ModelVersion> {
        let server = self.server_version();
        if version != server {
            return Err(DeployError::VersionConflict { local: version, server });
        }
        let next = ModelVersion::new(server.value() + 1);
        self.version.store(next.value(), Ordering::SeqCst);
        Ok(next)
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ModelsService for MockModelsService {
    async fn get_meta_data(&self) -> DeployResult<MetaDataPayload> {
        bump(&self.counters.meta_data);
        Ok(self.meta.clone())
    }

    async fn get_hierarchy(&self) -> DeployResult<Vec<HierarchyEntry>> {
        bump(&self.counters.hierarchy);
        Ok(self.hierarchy.clone())
    }

    async fn get_model_data(&self, id: &str) -> DeployResult<ModelDataPayload> {
        bump(&self.counters.model_data);
        self.models
            .get(id)
            .cloned()
            .ok_or_else(|| DeployError::NotFound(id.to_string()))
    }

    async fn get_properties(&self) -> DeployResult<Vec<ModelPayload>> {
        bump(&self.counters.properties);
        Ok(self.properties.clone())
    }

    async fn save_models(&self, change_sets: &[ModelChangeSet], version: ModelVersion) -> DeployResult<SaveResponse> {
        bump(&self.counters.save_models);
        let rejection = lock(&self.failures).save_rejection.clone();
        if let Some(report) = rejection {
            return Err(DeployError::Rejected(report));
        }
        let next = self.check_version(version)?;
        lock(&self.saved).extend_from_slice(change_sets);
        debug!(changes = change_sets.len(), version = %next, "mock saved models");
        Ok(SaveResponse { model_version: next })
    }

    async fn get_models_for_deploy(&self, _ids: &[String]) -> DeployResult<ModelsForDeploy> {
        bump(&self.counters.models_for_deploy);
        self.wait().await;
        if lock(&self.failures).models_for_deploy {
            return Err(DeployError::Service("deployable models unavailable".to_string()));
        }
        Ok(self.deployable.clone())
    }

    async fn deploy_models(&self, request: &DeployRequest) -> DeployResult<DeployResponse> {
        bump(&self.counters.deploy_models);
        self.wait().await;
        if lock(&self.failures).deploy {
            return Err(DeployError::Service("deployment failed".to_string()));
        }
        let next = self.check_version(request.version)?;
        lock(&self.deployed).push(request.clone());
        Ok(DeployResponse {
            model_version: next,
            deployed: request.models_to_deploy.clone(),
        })
    }
}
