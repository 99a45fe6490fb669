//! Console configuration read from `modelstack.toml`.

use modelstack_deploy::ManagementConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "modelstack.toml";

/// Settings for one console run.
///
/// ```toml
/// fixtures = "fixtures"
///
/// [management]
/// system_language = "EN"
/// user_language = "BG"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Directory the file-backed models service reads from.
    pub fixtures: PathBuf,
    pub management: ManagementConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            fixtures: PathBuf::from("fixtures"),
            management: ManagementConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Loads the configuration at `path`.
    ///
    /// A missing file yields the defaults. Unreadable or malformed files
    /// fall back to the defaults with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
