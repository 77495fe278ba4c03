//! Configuration module for devassist
//!
//! Handles loading and parsing of `.devassist.toml` configuration files
//! with support for environment variable expansion.

mod loader;
mod types;

pub use loader::{load_config, load_from_file, sample_config, ConfigError};
pub use types::{
    BuildConfig, BuildProject, DevAssistConfig, LlmConfig, OrchestratorConfig, ServerConfig,
};
