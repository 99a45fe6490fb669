//! Deployment dialog flow and its in-flight gate.

use async_trait::async_trait;
use modelstack_deploy::mock::MockModelsService;
use modelstack_deploy::{
    DeployCoordinator, DeployDialog, DeployError, DeployOutcome, DeployResult, DeployableModel, DialogOutcome,
    EventBus, ModelDeployRequest, ModelEvent, Notifier, ValidationReport,
};
use modelstack_model::LanguagePreference;
use modelstack_types::{Language, ModelVersion};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ── Fakes ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum DialogBehaviour {
    Confirm,
    Cancel,
    ClearSelection,
    Select(Vec<String>),
}

struct FakeDialog {
    behaviour: DialogBehaviour,
    opened: Mutex<Vec<ModelDeployRequest>>,
    dismissed: AtomicUsize,
}

impl FakeDialog {
    fn new(behaviour: DialogBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            opened: Mutex::new(Vec::new()),
            dismissed: AtomicUsize::new(0),
        })
    }

    fn opened(&self) -> Vec<ModelDeployRequest> {
        self.opened.lock().unwrap().clone()
    }

    fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeployDialog for FakeDialog {
    async fn open(&self, mut request: ModelDeployRequest) -> DeployResult<DialogOutcome> {
        self.opened.lock().unwrap().push(request.clone());
        match &self.behaviour {
            DialogBehaviour::Confirm => {}
            DialogBehaviour::Cancel => return Ok(DialogOutcome::Cancelled),
            DialogBehaviour::ClearSelection => {
                for id in request.selected_ids() {
                    request.deselect(&id)?;
                }
            }
            DialogBehaviour::Select(ids) => {
                for id in ids {
                    request.select(id)?;
                }
            }
        }
        Ok(DialogOutcome::Confirmed(request))
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl Notifier for FakeNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn lang(code: &str) -> Language {
    Language::parse(code).unwrap()
}

fn make_deployable() -> Vec<DeployableModel> {
    vec![
        DeployableModel::new("video")
            .with_label(lang("EN"), "Video")
            .with_label(lang("BG"), "Видео"),
        DeployableModel::new("audio")
            .with_label(lang("EN"), "Audio")
            .with_label(lang("BG"), "Аудио"),
        DeployableModel::new("media")
            .with_label(lang("EN"), "Media")
            .with_label(lang("BG"), "Медия"),
    ]
}

fn make_service() -> MockModelsService {
    let mut report = ValidationReport::default();
    report.add_error("audio", "missing codelist");
    MockModelsService::new().with_deployable(make_deployable(), report)
}

struct Harness {
    service: Arc<MockModelsService>,
    dialog: Arc<FakeDialog>,
    notifier: Arc<FakeNotifier>,
    events: EventBus,
    coordinator: DeployCoordinator,
}

fn make_harness(service: MockModelsService, behaviour: DialogBehaviour) -> Harness {
    let service = Arc::new(service);
    let dialog = FakeDialog::new(behaviour);
    let notifier = Arc::new(FakeNotifier::default());
    let events = EventBus::default();
    let coordinator = DeployCoordinator::new(service.clone(), dialog.clone(), notifier.clone(), events.clone());
    Harness {
        service,
        dialog,
        notifier,
        events,
        coordinator,
    }
}

fn ids(list: &[String]) -> Vec<&str> {
    list.iter().map(String::as_str).collect()
}

// ── Deploy request ──────────────────────────────────────────────

#[test]
fn request_sorts_by_description_and_preselects() {
    let languages = LanguagePreference::default();
    let request = ModelDeployRequest::new(
        make_deployable(),
        ValidationReport::default(),
        &["video".to_string(), "missing".to_string()],
        &languages,
    )
    .unwrap();

    assert_eq!(request.models.keys(), &["audio", "media", "video"]);
    assert_eq!(request.selected_ids(), vec!["video".to_string()]);
    assert!(request.can_confirm());
}

#[test]
fn request_sorts_in_user_language() {
    let languages = LanguagePreference::new(lang("BG"), lang("EN"));
    let request = ModelDeployRequest::new(make_deployable(), ValidationReport::default(), &[], &languages).unwrap();

    assert_eq!(request.models.keys(), &["audio", "video", "media"]);
    assert!(!request.can_confirm());
}

#[test]
fn selection_follows_model_order() {
    let mut request = ModelDeployRequest::new(
        make_deployable(),
        ValidationReport::default(),
        &[],
        &LanguagePreference::default(),
    )
    .unwrap();

    assert!(request.select("video").unwrap());
    assert!(request.select("audio").unwrap());
    assert!(!request.select("audio").unwrap());
    assert!(!request.select("missing").unwrap());
    assert_eq!(request.selected_ids(), vec!["audio".to_string(), "video".to_string()]);

    assert!(request.deselect("audio").unwrap());
    assert!(request.deselect("video").unwrap());
    assert!(!request.deselect("video").unwrap());
    assert!(!request.can_confirm());
}

// ── Deployment flow ─────────────────────────────────────────────

#[tokio::test]
async fn deploys_confirmed_selection() {
    let h = make_harness(make_service(), DialogBehaviour::Confirm);
    let mut rx = h.events.subscribe();

    let outcome = h.coordinator.on_model_deploy(&["video".to_string()]).await.unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Deployed {
            models: vec!["video".to_string()],
            version: ModelVersion::new(1),
        }
    );
    let opened = h.dialog.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].models.keys(), &["audio", "media", "video"]);
    assert!(!opened[0].validation_report.is_model_valid("audio"));
    assert_eq!(h.dialog.dismissed(), 1);
    assert_eq!(h.notifier.successes.lock().unwrap().len(), 1);

    let deployed = h.service.deployed();
    assert_eq!(ids(&deployed[0].models_to_deploy), vec!["video"]);
    assert_eq!(deployed[0].version, ModelVersion::default());
    assert_eq!(h.coordinator.version().await, ModelVersion::new(1));
    assert_eq!(
        rx.try_recv().unwrap(),
        ModelEvent::ModelsDeployed {
            models: vec!["video".to_string()],
            version: ModelVersion::new(1),
        }
    );
    assert!(!h.coordinator.is_deploying());
}

#[tokio::test]
async fn dialog_selection_is_deployed() {
    let h = make_harness(
        make_service(),
        DialogBehaviour::Select(vec!["media".to_string(), "audio".to_string()]),
    );

    let outcome = h.coordinator.on_model_deploy(&[]).await.unwrap();

    let DeployOutcome::Deployed { models, .. } = outcome else {
        panic!("expected a deployment, got {outcome:?}");
    };
    assert_eq!(ids(&models), vec!["audio", "media"]);
}

#[tokio::test(start_paused = true)]
async fn second_request_while_deploying_is_dropped() {
    let h = make_harness(
        make_service().with_delay(Duration::from_millis(200)),
        DialogBehaviour::Confirm,
    );
    let preselected = vec!["video".to_string()];

    let (first, second) = tokio::join!(
        h.coordinator.on_model_deploy(&preselected),
        h.coordinator.on_model_deploy(&preselected)
    );

    assert!(matches!(first.unwrap(), DeployOutcome::Deployed { .. }));
    assert_eq!(second.unwrap(), DeployOutcome::AlreadyInProgress);
    assert_eq!(h.dialog.opened().len(), 1);
    assert_eq!(h.service.calls().models_for_deploy, 1);
    assert_eq!(h.service.calls().deploy_models, 1);
    assert!(!h.coordinator.is_deploying());
}

#[tokio::test]
async fn fetch_failure_resets_gate() {
    let h = make_harness(make_service(), DialogBehaviour::Confirm);
    h.service.fail_models_for_deploy(true);

    let err = h.coordinator.on_model_deploy(&[]).await.unwrap_err();

    assert!(matches!(err, DeployError::Service(_)));
    assert!(!h.coordinator.is_deploying());
    assert!(h.dialog.opened().is_empty());
    assert_eq!(h.dialog.dismissed(), 0);
    assert_eq!(h.notifier.errors.lock().unwrap().len(), 1);

    h.service.fail_models_for_deploy(false);
    let outcome = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap();
    assert!(matches!(outcome, DeployOutcome::Deployed { .. }));
}

#[tokio::test]
async fn deploy_failure_dismisses_dialog() {
    let h = make_harness(make_service(), DialogBehaviour::Confirm);
    h.service.fail_deploy(true);

    let err = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap_err();

    assert!(matches!(err, DeployError::Service(_)));
    assert_eq!(h.dialog.dismissed(), 1);
    assert!(h.notifier.successes.lock().unwrap().is_empty());
    assert_eq!(h.notifier.errors.lock().unwrap().len(), 1);
    assert!(!h.coordinator.is_deploying());
    assert_eq!(h.coordinator.version().await, ModelVersion::default());
}

#[tokio::test]
async fn cancelled_dialog_deploys_nothing() {
    let h = make_harness(make_service(), DialogBehaviour::Cancel);

    let outcome = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Cancelled);
    assert_eq!(h.service.calls().deploy_models, 0);
    assert_eq!(h.dialog.dismissed(), 1);
}

#[tokio::test]
async fn empty_selection_cannot_be_confirmed() {
    let h = make_harness(make_service(), DialogBehaviour::ClearSelection);

    let outcome = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap();

    assert_eq!(outcome, DeployOutcome::NothingSelected);
    assert_eq!(h.service.calls().deploy_models, 0);
    assert_eq!(h.dialog.dismissed(), 1);
}

#[tokio::test]
async fn version_conflict_is_reported() {
    let h = make_harness(make_service(), DialogBehaviour::Confirm);
    h.service.set_server_version(ModelVersion::new(3));

    let err = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap_err();
    assert!(matches!(err, DeployError::VersionConflict { .. }));

    h.coordinator.observe_version(ModelVersion::new(3)).await;
    let outcome = h.coordinator.on_model_deploy(&["audio".to_string()]).await.unwrap();
    assert_eq!(
        outcome,
        DeployOutcome::Deployed {
            models: vec!["audio".to_string()],
            version: ModelVersion::new(4),
        }
    );
}
