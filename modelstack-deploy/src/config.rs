use modelstack_model::LanguagePreference;
use modelstack_types::Language;
use serde::{Deserialize, Serialize};

/// Languages the management session describes and sorts models in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    /// Fallback when a model has no label in the user language.
    pub system_language: Language,
    pub user_language: Language,
}

impl ManagementConfig {
    pub fn languages(&self) -> LanguagePreference {
        LanguagePreference::new(self.user_language.clone(), self.system_language.clone())
    }
}
