//! Model management service.
//!
//! Owns the model tree of one editing session and caches everything fetched
//! from the [`ModelsService`]: metadata, the hierarchy, semantic properties
//! and the models linked so far. Edits go through the action processor;
//! saving sends the change-sets of the dirty models with the cached
//! [`ModelVersion`] and commits what was sent once the server accepts it.
//! Restoring an inherited entry leaves nothing dirty behind, so restore
//! records are queued until they are saved.

use crate::config::ManagementConfig;
use crate::error::{DeployError, DeployResult};
use crate::events::{EventBus, ModelEvent};
use crate::service::{DeployRequest, DeployResponse, ModelsService};
use modelstack_actions::{ActionProcessor, ExecutedAction, ModelAction};
use modelstack_model::{
    AttributeValidator, ChangeSetBuilder, HierarchyItem, LanguagePreference, MetaDataBuilder, ModelChangeSet,
    ModelDataPayload, ModelHierarchy, ModelLinker, ModelOperation, ModelPayload, ModelRef, ModelTree, ModelType,
    ModelsMetaData,
};
use modelstack_types::{ModelVersion, NodeId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a getter may answer from the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Load {
    #[default]
    Cached,
    /// Fetch again even when cached.
    Reload,
}

pub struct ModelManagementService {
    service: Arc<dyn ModelsService>,
    config: ManagementConfig,
    languages: LanguagePreference,
    events: EventBus,
    processor: ActionProcessor,
    validator: AttributeValidator,
    tree: ModelTree,
    meta: Option<ModelsMetaData>,
    hierarchy: Option<ModelHierarchy>,
    properties: Option<Vec<NodeId>>,
    pending_restores: Vec<ModelChangeSet>,
    version: ModelVersion,
}

impl ModelManagementService {
    pub fn new(service: Arc<dyn ModelsService>, config: ManagementConfig, events: EventBus) -> Self {
        Self {
            service,
            languages: config.languages(),
            config,
            events,
            processor: ActionProcessor::new(),
            validator: AttributeValidator::new(),
            tree: ModelTree::new(),
            meta: None,
            hierarchy: None,
            properties: None,
            pending_restores: Vec::new(),
            version: ModelVersion::default(),
        }
    }

    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.version = version;
        self
    }

    pub fn tree(&self) -> &ModelTree {
        &self.tree
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    pub fn languages(&self) -> &LanguagePreference {
        &self.languages
    }

    pub fn version(&self) -> ModelVersion {
        self.version
    }

    pub fn describe(&self, node: NodeId) -> String {
        self.tree.description(node, &self.languages)
    }

    // ── Loading ──────────────────────────────────────────────────

    pub async fn meta_data(&mut self, load: Load) -> DeployResult<&ModelsMetaData> {
        if load == Load::Reload || self.meta.is_none() {
            let payload = self.service.get_meta_data().await?;
            let meta = MetaDataBuilder::build(payload)?;
            debug!("loaded model metadata");
            self.meta = Some(meta);
        }
        self.meta
            .as_ref()
            .ok_or_else(|| DeployError::Service("metadata unavailable".to_string()))
    }

    /// The class hierarchy. Reloading it starts a new tree, which drops
    /// every linked model and unsaved edit.
    pub async fn hierarchy(&mut self, load: Load) -> DeployResult<&ModelHierarchy> {
        if load == Load::Reload || self.hierarchy.is_none() {
            let entries = self.service.get_hierarchy().await?;
            let mut tree = ModelTree::new();
            let hierarchy = ModelHierarchy::build(&mut tree, &entries)?;
            debug!(models = hierarchy.flat.len(), "loaded model hierarchy");
            self.tree = tree;
            self.hierarchy = Some(hierarchy);
            self.properties = None;
            self.pending_restores.clear();
        }
        self.hierarchy
            .as_ref()
            .ok_or_else(|| DeployError::Service("hierarchy unavailable".to_string()))
    }

    /// Semantic properties, linked against the property metadata.
    pub async fn properties(&mut self, load: Load) -> DeployResult<Vec<NodeId>> {
        self.meta_data(Load::Cached).await?;
        self.hierarchy(Load::Cached).await?;
        if let (Load::Cached, Some(properties)) = (load, &self.properties) {
            return Ok(properties.clone());
        }

        let payloads = self.service.get_properties().await?;
        let meta = self.meta.as_ref().ok_or_else(|| DeployError::Service("metadata unavailable".to_string()))?;
        let linker = ModelLinker::new(meta);
        let mut linked = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            linked.push(linker.link_property(&mut self.tree, payload)?);
        }
        debug!(properties = linked.len(), "loaded semantic properties");
        self.properties = Some(linked.clone());
        Ok(linked)
    }

    /// Every class and definition, loading what is missing.
    ///
    /// [`Load::Reload`] drops all caches first.
    pub async fn get_models(&mut self, load: Load) -> DeployResult<Vec<NodeId>> {
        self.meta_data(load).await?;
        self.hierarchy(load).await?;
        self.properties(load).await?;
        if load == Load::Reload {
            info!("reloaded models");
            self.events.publish(ModelEvent::ModelsReloaded);
        }
        Ok(self.tree.models().models().to_vec())
    }

    pub fn has_model(&self, id: &str) -> bool {
        self.tree.has_model(id)
    }

    /// A linked model. Its ancestors and class are linked first.
    pub async fn get_model(&mut self, id: &str) -> DeployResult<NodeId> {
        self.meta_data(Load::Cached).await?;
        self.hierarchy(Load::Cached).await?;
        let node = self
            .hierarchy
            .as_ref()
            .and_then(|hierarchy| hierarchy.get(id))
            .or_else(|| self.tree.get_model(id))
            .ok_or_else(|| DeployError::NotFound(id.to_string()))?;
        if self.tree.node(node).is_loaded() {
            return Ok(node);
        }

        let data = self.service.get_model_data(id).await?;
        let chain = self.link_order(node);
        let meta = self.meta.as_ref().ok_or_else(|| DeployError::Service("metadata unavailable".to_string()))?;
        let linker = ModelLinker::new(meta);
        for model in chain {
            if self.tree.node(model).is_loaded() {
                continue;
            }
            let model_id = self.tree.node(model).id().to_string();
            let payload = find_payload(&data, self.tree.node(model).model_type(), &model_id)
                .ok_or_else(|| DeployError::NotFound(model_id.clone()))?;
            linker.link_model(&mut self.tree, model, payload)?;
            debug!(model = %model_id, "linked model");
        }
        Ok(node)
    }

    /// Classes before definitions, ancestors before descendants.
    fn link_order(&self, node: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if let Some(class) = self.tree.node(node).class() {
            order.extend(self.tree.ancestors(class).into_iter().rev());
            order.push(class);
        }
        for ancestor in self.tree.ancestors(node).into_iter().rev() {
            if let Some(class) = self.tree.node(ancestor).class() {
                if !order.contains(&class) {
                    order.extend(self.tree.ancestors(class).into_iter().rev());
                    order.push(class);
                }
            }
            order.push(ancestor);
        }
        order.push(node);
        order
    }

    /// Creates an empty definition under `parent` (a class or definition).
    pub async fn add_model(&mut self, id: &str, parent: &str) -> DeployResult<NodeId> {
        let parent = self.get_model(parent).await?;
        if self.tree.has_model(id) {
            return Err(DeployError::DuplicateModel(id.to_string()));
        }
        let node = self.tree.create_definition(id, parent)?;
        let meta = self.meta.as_ref().ok_or_else(|| DeployError::Service("metadata unavailable".to_string()))?;
        ModelLinker::new(meta).link_model(&mut self.tree, node, &ModelPayload::new(id))?;

        if let Some(hierarchy) = &mut self.hierarchy {
            hierarchy.flat.insert(id.to_string(), node);
            let item = HierarchyItem {
                root: node,
                children: Vec::new(),
            };
            if !attach(&mut hierarchy.tree, parent, item) {
                warn!(model = id, "parent missing from hierarchy tree");
            }
        }
        info!(model = id, parent = self.tree.node(parent).id(), "added model");
        Ok(node)
    }

    // ── Editing ──────────────────────────────────────────────────

    pub fn execute(&mut self, action: ModelAction) -> DeployResult<ExecutedAction> {
        let executed = self.processor.execute(&mut self.tree, action)?;
        if is_inherited_restore(&executed) {
            match self.processor.changeset(&self.tree, &executed) {
                Ok(change) => {
                    debug!(path = %change.path, "queued restore");
                    self.pending_restores.push(change);
                }
                Err(error) => {
                    self.processor.revert(&mut self.tree, &executed)?;
                    return Err(error.into());
                }
            }
        }
        Ok(executed)
    }

    pub fn revert(&mut self, executed: &ExecutedAction) -> DeployResult<()> {
        if !is_inherited_restore(executed) {
            return Ok(self.processor.revert(&mut self.tree, executed)?);
        }
        let change = self.processor.changeset(&self.tree, executed)?;
        self.processor.revert(&mut self.tree, executed)?;
        if let Some(position) = self
            .pending_restores
            .iter()
            .rposition(|pending| pending.path == change.path)
        {
            self.pending_restores.remove(position);
        }
        Ok(())
    }

    pub fn changeset(&self, executed: &ExecutedAction) -> DeployResult<ModelChangeSet> {
        Ok(self.processor.changeset(&self.tree, executed)?)
    }

    /// Validates a model and everything it holds.
    pub fn validate(&mut self, node: NodeId) -> DeployResult<bool> {
        Ok(self.validator.validate_model(&mut self.tree, node)?)
    }

    /// Queued restores in the order they were made, then the change-sets
    /// of every dirty model in model order.
    pub fn changes(&self) -> DeployResult<Vec<ModelChangeSet>> {
        let mut changes = self.pending_restores.clone();
        for model in self.tree.dirty_models() {
            changes.extend(ChangeSetBuilder::collect(&self.tree, model)?);
        }
        Ok(changes)
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Sends `changes` made against the cached version.
    ///
    /// On success the version moves forward, the attributes the updates
    /// name take their current values as baseline and the restores sent
    /// leave the queue. Anything not sent stays pending. A rejection
    /// leaves everything pending.
    pub async fn save(&mut self, changes: &[ModelChangeSet]) -> DeployResult<ModelVersion> {
        if changes.is_empty() {
            debug!("nothing to save");
            return Ok(self.version);
        }
        let response = self.service.save_models(changes, self.version).await?;
        self.advance_version(response.model_version);
        self.commit_sent(changes);
        self.pending_restores.retain(|pending| !changes.contains(pending));
        info!(changes = changes.len(), version = %self.version, "saved models");
        self.events.publish(ModelEvent::ModelsSaved { version: self.version });
        Ok(self.version)
    }

    fn commit_sent(&mut self, changes: &[ModelChangeSet]) {
        for change in changes.iter().filter(|change| change.operation == ModelOperation::Update) {
            match change.path.walk(&self.tree) {
                Ok(ModelRef::Attribute(attribute)) => self.tree.commit_attribute(attribute),
                Ok(ModelRef::Node(_)) => warn!(path = %change.path, "saved update does not name an attribute"),
                Err(error) => warn!(%error, path = %change.path, "saved update no longer resolves"),
            }
        }
    }

    /// Saves every dirty model and queued restore.
    pub async fn save_all(&mut self) -> DeployResult<ModelVersion> {
        let changes = self.changes()?;
        self.save(&changes).await
    }

    /// Publishes models at the cached version.
    pub async fn deploy(&mut self, models: Vec<String>) -> DeployResult<DeployResponse> {
        let request = DeployRequest {
            models_to_deploy: models,
            version: self.version,
        };
        let response = self.service.deploy_models(&request).await?;
        self.advance_version(response.model_version);
        info!(models = request.models_to_deploy.len(), version = %self.version, "deployed models");
        self.events.publish(ModelEvent::ModelsDeployed {
            models: request.models_to_deploy,
            version: self.version,
        });
        Ok(response)
    }

    fn advance_version(&mut self, version: ModelVersion) {
        if self.version.advance_to(version) {
            debug!(version = %self.version, "model version advanced");
        } else {
            warn!(current = %self.version, received = %version, "ignored stale model version");
        }
    }

    // ── Events ───────────────────────────────────────────────────

    /// Applies a session event published elsewhere.
    pub fn handle_event(&mut self, event: &ModelEvent) {
        match event {
            ModelEvent::LanguageChanged(language) => {
                self.config.user_language = language.clone();
                self.languages = self.config.languages();
                debug!(%language, "user language changed");
            }
            ModelEvent::ConfigurationUpdated(config) => {
                self.config = config.clone();
                self.languages = self.config.languages();
                debug!(system = %config.system_language, "configuration updated");
            }
            ModelEvent::ModelsDeployed { version, .. } | ModelEvent::ModelsSaved { version } => {
                if self.version.advance_to(*version) {
                    debug!(version = %self.version, "model version advanced");
                }
            }
            ModelEvent::ModelsReloaded => {}
        }
    }
}

fn is_inherited_restore(executed: &ExecutedAction) -> bool {
    matches!(
        executed.action,
        ModelAction::RestoreAttribute { inherited: true, .. } | ModelAction::RestoreInheritedNode { .. }
    )
}

fn find_payload<'a>(data: &'a ModelDataPayload, model_type: ModelType, id: &str) -> Option<&'a ModelPayload> {
    let payloads = match model_type {
        ModelType::Class => &data.classes,
        _ => &data.definitions,
    };
    payloads.iter().find(|payload| payload.id == id)
}

fn attach(items: &mut [HierarchyItem], parent: NodeId, item: HierarchyItem) -> bool {
    let mut pending = Some(item);
    attach_into(items, parent, &mut pending);
    pending.is_none()
}

fn attach_into(items: &mut [HierarchyItem], parent: NodeId, pending: &mut Option<HierarchyItem>) {
    for current in items {
        if pending.is_none() {
            return;
        }
        if current.root == parent {
            if let Some(item) = pending.take() {
                current.children.push(item);
            }
            return;
        }
        attach_into(&mut current.children, parent, pending);
    }
}
