//! Deployment coordinator.
//!
//! Drives one deployment at a time: fetch the deployable models and their
//! validation, let the user pick in a dialog, publish the selection.
//! Re-entry while a deployment is in flight is dropped.

use crate::error::{DeployError, DeployResult};
use crate::events::{EventBus, ModelEvent};
use crate::service::{DeployRequest, DeployableModel, ModelsService, ValidationReport};
use async_trait::async_trait;
use modelstack_model::{LanguagePreference, ModelList};
use modelstack_types::{DeploymentId, ModelVersion};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Steps of a deployment, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    Requesting,
    AwaitingSelection,
    Confirming,
    Deploying,
}

/// The models offered in one deployment dialog and the user's pick.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDeployRequest {
    pub session: DeploymentId,
    /// Every deployable model, sorted by description.
    pub models: ModelList<DeployableModel>,
    /// The picked models, in the order of `models`.
    pub selected_models: ModelList<DeployableModel>,
    pub validation_report: ValidationReport,
}

impl ModelDeployRequest {
    /// Sorts `models` by their description in `languages` and selects the
    /// ones listed in `preselected`.
    pub fn new(
        models: Vec<DeployableModel>,
        validation_report: ValidationReport,
        preselected: &[String],
        languages: &LanguagePreference,
    ) -> DeployResult<Self> {
        let mut sorted: Vec<(String, DeployableModel)> = models
            .into_iter()
            .map(|model| (languages.describe(&model.labels, &model.id), model))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut list = ModelList::new();
        for (_, model) in sorted {
            list.insert(model)?;
        }
        let mut request = Self {
            session: DeploymentId::new(),
            models: list,
            selected_models: ModelList::new(),
            validation_report,
        };
        for id in preselected {
            request.select(id)?;
        }
        Ok(request)
    }

    /// Adds a model to the selection. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> DeployResult<bool> {
        if !self.models.has_model(id) || self.selected_models.has_model(id) {
            return Ok(false);
        }
        let selected: Vec<DeployableModel> = self
            .models
            .models()
            .iter()
            .filter(|model| model.id == id || self.selected_models.has_model(&model.id))
            .cloned()
            .collect();
        let mut list = ModelList::new();
        for model in selected {
            list.insert(model)?;
        }
        self.selected_models = list;
        Ok(true)
    }

    pub fn deselect(&mut self, id: &str) -> DeployResult<bool> {
        Ok(self.selected_models.remove(id)?.is_some())
    }

    /// Confirmation is disabled while nothing is selected.
    pub fn can_confirm(&self) -> bool {
        !self.selected_models.is_empty()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected_models.keys().to_vec()
    }

    pub fn to_deploy_request(&self, version: ModelVersion) -> DeployRequest {
        DeployRequest {
            models_to_deploy: self.selected_ids(),
            version,
        }
    }
}

/// What the user did with the deployment dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    Confirmed(ModelDeployRequest),
    Cancelled,
}

/// The selection dialog.
#[async_trait]
pub trait DeployDialog: Send + Sync {
    /// Shows the request and waits for the user to confirm or cancel.
    async fn open(&self, request: ModelDeployRequest) -> DeployResult<DialogOutcome>;

    /// Closes the dialog. Called once per opened dialog, whatever the outcome.
    fn dismiss(&self);
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Result of [`DeployCoordinator::on_model_deploy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed { models: Vec<String>, version: ModelVersion },
    Cancelled,
    /// Confirmed with an empty selection.
    NothingSelected,
    /// Another deployment of this coordinator is in flight.
    AlreadyInProgress,
}

/// Holds the in-flight flag and clears it when dropped.
struct DeployGuard<'a>(&'a AtomicBool);

impl<'a> DeployGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DeployGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
        debug!(state = ?DeployState::Idle, "deployment finished");
    }
}

pub struct DeployCoordinator {
    service: Arc<dyn ModelsService>,
    dialog: Arc<dyn DeployDialog>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    languages: RwLock<LanguagePreference>,
    version: RwLock<ModelVersion>,
    deploying: AtomicBool,
}

impl DeployCoordinator {
    pub fn new(
        service: Arc<dyn ModelsService>,
        dialog: Arc<dyn DeployDialog>,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
    ) -> Self {
        Self {
            service,
            dialog,
            notifier,
            events,
            languages: RwLock::new(LanguagePreference::default()),
            version: RwLock::new(ModelVersion::default()),
            deploying: AtomicBool::new(false),
        }
    }

    pub fn is_deploying(&self) -> bool {
        self.deploying.load(Ordering::SeqCst)
    }

    pub async fn set_languages(&self, languages: LanguagePreference) {
        *self.languages.write().await = languages;
    }

    /// Moves the version sent with deployments forward.
    pub async fn observe_version(&self, version: ModelVersion) {
        self.version.write().await.advance_to(version);
    }

    pub async fn version(&self) -> ModelVersion {
        *self.version.read().await
    }

    /// Runs a deployment with `preselected` checked in the dialog.
    ///
    /// Returns [`DeployOutcome::AlreadyInProgress`] without touching the
    /// service or the dialog while another call is running.
    pub async fn on_model_deploy(&self, preselected: &[String]) -> DeployResult<DeployOutcome> {
        let Some(_guard) = DeployGuard::acquire(&self.deploying) else {
            warn!("deployment already in progress, request dropped");
            return Ok(DeployOutcome::AlreadyInProgress);
        };

        debug!(state = ?DeployState::Requesting, preselected = preselected.len(), "requesting deployable models");
        let available = match self.service.get_models_for_deploy(preselected).await {
            Ok(available) => available,
            Err(error) => {
                self.notifier.error(&error.to_string());
                return Err(error);
            }
        };
        let languages = self.languages.read().await.clone();
        let request = ModelDeployRequest::new(
            available.models,
            available.validation_report,
            preselected,
            &languages,
        )?;
        let session = request.session;

        debug!(state = ?DeployState::AwaitingSelection, %session, models = request.models.size(), "opening deploy dialog");
        let outcome = self.dialog.open(request).await;
        let result = self.confirm(session, outcome).await;
        self.dialog.dismiss();

        if let Err(error) = &result {
            self.notifier.error(&error.to_string());
        }
        result
    }

    async fn confirm(
        &self,
        session: DeploymentId,
        outcome: DeployResult<DialogOutcome>,
    ) -> DeployResult<DeployOutcome> {
        let request = match outcome? {
            DialogOutcome::Cancelled => {
                debug!(%session, "deployment cancelled");
                return Ok(DeployOutcome::Cancelled);
            }
            DialogOutcome::Confirmed(request) => request,
        };
        debug!(state = ?DeployState::Confirming, %session, selected = request.selected_models.size());
        if !request.can_confirm() {
            warn!(%session, "deployment confirmed without a selection");
            return Ok(DeployOutcome::NothingSelected);
        }

        debug!(state = ?DeployState::Deploying, %session, "deploying models");
        let deploy_request = request.to_deploy_request(self.version().await);
        let response = self.service.deploy_models(&deploy_request).await?;
        if response.model_version < deploy_request.version {
            return Err(DeployError::Service(format!(
                "deployment answered with {} older than {}",
                response.model_version, deploy_request.version
            )));
        }
        self.observe_version(response.model_version).await;

        let models = deploy_request.models_to_deploy;
        info!(%session, models = models.len(), version = %response.model_version, "models deployed");
        self.notifier.success(&format!("Deployed {} model(s)", models.len()));
        self.events.publish(ModelEvent::ModelsDeployed {
            models: models.clone(),
            version: response.model_version,
        });
        Ok(DeployOutcome::Deployed {
            models,
            version: response.model_version,
        })
    }
}
