//! The console session behind each subcommand.

use crate::config::ConsoleConfig;
use crate::files::FileModelsService;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use modelstack_actions::ModelAction;
use modelstack_deploy::{
    DeployCoordinator, DeployDialog, DeployOutcome, DeployResult, DialogOutcome, EventBus, Load,
    ModelDeployRequest, ModelEvent, ModelManagementService, Notifier,
};
use modelstack_model::{LanguagePreference, ModelOperation, ModelPath, ModelRef, ModelTree};
use modelstack_types::{AttributeId, Language, ModelVersion, NodeId};
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{error, info, warn};

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub struct Console {
    service: Arc<FileModelsService>,
    events: EventBus,
    receiver: Receiver<ModelEvent>,
    management: ModelManagementService,
}

impl Console {
    pub async fn open(config: &ConsoleConfig) -> Result<Self> {
        let service = FileModelsService::open(&config.fixtures)
            .await
            .with_context(|| format!("Failed to open fixtures at {:?}", config.fixtures))?;
        let service = Arc::new(service);
        let version = service.version().await;
        let events = EventBus::default();
        let receiver = events.subscribe();
        let management = ModelManagementService::new(service.clone(), config.management.clone(), events.clone())
            .with_version(version);
        Ok(Self {
            service,
            events,
            receiver,
            management,
        })
    }

    pub fn management(&self) -> &ModelManagementService {
        &self.management
    }

    /// Switches the language models are described in.
    pub fn set_language(&mut self, language: Language) {
        self.events.publish(ModelEvent::LanguageChanged(language));
        self.sync_events();
    }

    fn sync_events(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => self.management.handle_event(&event),
                Err(TryRecvError::Lagged(skipped)) => warn!("Missed {} session events", skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    // ── show ─────────────────────────────────────────────────────

    /// Lists every model, or prints one model with its attributes and children.
    pub async fn show(&mut self, model: Option<&str>, out: &mut impl Write) -> Result<()> {
        let Some(id) = model else {
            let models = self.management.get_models(Load::Cached).await?;
            let tree = self.management.tree();
            for node in models {
                let model = tree.node(node);
                let marker = if model.is_abstract() { " (abstract)" } else { "" };
                writeln!(
                    out,
                    "{:<10} {:<24} {}{}",
                    model.model_type(),
                    model.id(),
                    self.management.describe(node),
                    marker
                )?;
            }
            return Ok(());
        };

        let node = self.management.get_model(id).await?;
        let tree = self.management.tree();
        writeln!(
            out,
            "{} {}  {}",
            tree.node(node).model_type(),
            id,
            self.management.describe(node)
        )?;
        write_node(tree, node, node, 1, out)?;
        Ok(())
    }

    // ── set ──────────────────────────────────────────────────────

    /// Sets the attribute at `path` and saves the change.
    ///
    /// `path` is rooted at the edited model, for example
    /// `definition=media/field=title/attribute=displayType`.
    pub async fn set(&mut self, path: &str, value: &str, out: &mut impl Write) -> Result<ModelVersion> {
        let path: ModelPath = path.parse()?;
        let root = path.first().context("Empty path")?.id.clone();
        let context = self.management.get_model(&root).await?;
        let attribute = match self.management.tree().resolve_path(&path, context)? {
            ModelRef::Attribute(attribute) => attribute,
            ModelRef::Node(_) => bail!("{path} does not name an attribute"),
        };

        let executed = self.management.execute(ModelAction::ChangeAttribute {
            attribute,
            context,
            value: parse_value(value),
        })?;
        if executed.is_structural() {
            info!("Overrode inherited attribute {}", path);
        }
        let change = self.management.changeset(&executed)?;
        let operation = match change.operation {
            ModelOperation::Update => "update",
            ModelOperation::Restore => "restore",
        };
        writeln!(
            out,
            "{operation} {}: {} -> {}",
            change.path, change.old_value, change.new_value
        )?;

        if !self.management.validate(context)? {
            warn!("Model {} has validation errors", root);
        }
        let version = self.management.save_all().await?;
        self.sync_events();
        writeln!(out, "saved at version {version}")?;
        Ok(version)
    }

    // ── validate ─────────────────────────────────────────────────

    /// Validates a model and prints every invalid attribute.
    pub async fn validate(&mut self, id: &str, out: &mut impl Write) -> Result<bool> {
        let node = self.management.get_model(id).await?;
        let valid = self.management.validate(node)?;
        let tree = self.management.tree();
        let mut invalid = Vec::new();
        collect_invalid(tree, node, node, &mut invalid);
        for attribute in invalid {
            let path = ModelPath::for_attribute(tree, attribute, node)?;
            for error in tree.validation(node, attribute).errors() {
                writeln!(out, "{path}: {}", error.label)?;
            }
        }
        writeln!(out, "{id}: {}", if valid { "valid" } else { "invalid" })?;
        Ok(valid)
    }

    // ── deploy ───────────────────────────────────────────────────

    /// Deploys `models`, or every model the server reports valid with `all`.
    pub async fn deploy(&mut self, models: &[String], all: bool, out: &mut impl Write) -> Result<DeployOutcome> {
        let dialog = Arc::new(ConsoleDialog::new(all, self.management.languages().clone()));
        let coordinator = DeployCoordinator::new(
            self.service.clone(),
            dialog.clone(),
            Arc::new(LogNotifier),
            self.events.clone(),
        );
        coordinator.set_languages(self.management.languages().clone()).await;
        coordinator.observe_version(self.management.version()).await;

        let outcome = coordinator.on_model_deploy(models).await;
        for line in dialog.take_lines() {
            writeln!(out, "{line}")?;
        }
        let outcome = outcome?;
        self.sync_events();
        match &outcome {
            DeployOutcome::Deployed { models, version } => {
                writeln!(out, "deployed {} at version {version}", models.join(", "))?
            }
            DeployOutcome::NothingSelected => writeln!(out, "nothing selected")?,
            DeployOutcome::Cancelled | DeployOutcome::AlreadyInProgress => {}
        }
        Ok(outcome)
    }
}

fn write_node(tree: &ModelTree, node: NodeId, context: NodeId, depth: usize, out: &mut impl Write) -> Result<()> {
    let indent = "  ".repeat(depth);
    let overrides = tree.overrides(node);
    for &attribute in tree.node(node).attributes().models() {
        let model = tree.attribute(attribute);
        let origin = if overrides.contains(&attribute) {
            " [override]"
        } else if !tree.is_owned_by(attribute, context) {
            " [inherited]"
        } else {
            ""
        };
        let dirty = if model.is_dirty() { " *" } else { "" };
        writeln!(out, "{indent}{} = {}{origin}{dirty}", model.id(), model.current_value())?;
    }
    for (model_type, children) in tree.node(node).kind().child_lists() {
        for &child in children.models() {
            writeln!(out, "{indent}{model_type} {}", tree.node(child).id())?;
            write_node(tree, child, context, depth + 1, out)?;
        }
    }
    Ok(())
}

fn collect_invalid(tree: &ModelTree, context: NodeId, node: NodeId, invalid: &mut Vec<AttributeId>) {
    invalid.extend(
        tree.node(node)
            .attributes()
            .models()
            .iter()
            .copied()
            .filter(|&attribute| !tree.validation(context, attribute).is_valid()),
    );
    for child in tree.held_children(node) {
        collect_invalid(tree, context, child, invalid);
    }
}

/// Non-interactive deployment dialog.
///
/// Lists the offered models and confirms either the preselection or, with
/// `select_valid`, every model without validation errors.
struct ConsoleDialog {
    select_valid: bool,
    languages: LanguagePreference,
    lines: Mutex<Vec<String>>,
}

impl ConsoleDialog {
    fn new(select_valid: bool, languages: LanguagePreference) -> Self {
        Self {
            select_valid,
            languages,
            lines: Mutex::new(Vec::new()),
        }
    }

    fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl DeployDialog for ConsoleDialog {
    async fn open(&self, mut request: ModelDeployRequest) -> DeployResult<DialogOutcome> {
        if self.select_valid {
            let valid: Vec<String> = request
                .models
                .keys()
                .iter()
                .filter(|id| request.validation_report.is_model_valid(id))
                .cloned()
                .collect();
            for id in valid {
                request.select(&id)?;
            }
        }

        let mut lines = Vec::with_capacity(request.models.size());
        for model in request.models.models() {
            let mark = if request.selected_models.has_model(&model.id) { "x" } else { " " };
            let errors = request.validation_report.errors_for(&model.id);
            let status = if errors.is_empty() {
                String::new()
            } else {
                format!("  ({})", errors.join("; "))
            };
            lines.push(format!(
                "[{mark}] {:<24} {}{status}",
                model.id,
                self.languages.describe(&model.labels, &model.id)
            ));
        }
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(lines);
        Ok(DialogOutcome::Confirmed(request))
    }

    fn dismiss(&self) {}
}

struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}
