//! Command-line administration console for ModelStack.
//!
//! Wires the management service and the deployment coordinator to a
//! directory of JSON fixtures standing in for the models server.

pub mod commands;
pub mod config;
pub mod files;

pub use commands::{Console, parse_value};
pub use config::{ConsoleConfig, DEFAULT_CONFIG_FILE};
pub use files::{FileModelsService, STATE_FILE, ServerState};
