//! Typed notifications between the console and the engine.

use crate::config::ManagementConfig;
use modelstack_types::{Language, ModelVersion};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

/// Something that happened to the session or its models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// The user switched the interface language.
    LanguageChanged(Language),
    ConfigurationUpdated(ManagementConfig),
    /// Caches were dropped and fetched again.
    ModelsReloaded,
    ModelsSaved { version: ModelVersion },
    ModelsDeployed { models: Vec<String>, version: ModelVersion },
}

/// Broadcast channel for [`ModelEvent`]s.
///
/// Every subscriber sees every event published after it subscribed.
/// Dropping the receiver unsubscribes.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ModelEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.sender.subscribe()
    }

    /// Sends an event and returns how many subscribers got it.
    pub fn publish(&self, event: ModelEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "no subscribers for model event");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
