//! Configuration types for devassist
//!
//! Defines the structure of `.devassist.toml` configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevAssistConfig {
    /// Repository all tools operate on (defaults to the working directory)
    #[serde(default)]
    pub repo_path: Option<PathBuf>,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Model service settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Tool-calling loop limits
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Build tool settings
    #[serde(default)]
    pub build: BuildConfig,
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Expected bearer token; requests are not checked when unset
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            auth_token: None,
        }
    }
}

/// Model service section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (supports ${ENV_VAR} syntax)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the Messages API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token limit per model call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
        }
    }
}

/// Limits for one conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum model calls per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Wall-clock budget per turn in seconds
    #[serde(default = "default_turn_budget")]
    pub turn_budget_secs: u64,
}

fn default_max_iterations() -> usize {
    25
}

fn default_turn_budget() -> u64 {
    600
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            turn_budget_secs: default_turn_budget(),
        }
    }
}

/// Build tool section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build timeout in milliseconds
    #[serde(default = "default_build_timeout")]
    pub timeout_ms: u64,

    /// Number of trailing output lines returned to the model
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,

    /// Buildable projects by name
    #[serde(default = "default_projects")]
    pub projects: BTreeMap<String, BuildProject>,
}

/// A project the build tool may run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProject {
    /// Directory relative to the repository root
    pub path: PathBuf,

    /// Program and arguments, run without a shell
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,
}

fn default_build_timeout() -> u64 {
    120_000
}

fn default_tail_lines() -> usize {
    40
}

fn default_build_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "build".to_string()]
}

fn default_projects() -> BTreeMap<String, BuildProject> {
    let mut projects = BTreeMap::new();

    projects.insert(
        "ethos".to_string(),
        BuildProject {
            path: PathBuf::from("."),
            command: default_build_command(),
        },
    );

    projects.insert(
        "guildry".to_string(),
        BuildProject {
            path: PathBuf::from("guildry/apps/web"),
            command: default_build_command(),
        },
    );

    projects
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_build_timeout(),
            tail_lines: default_tail_lines(),
            projects: default_projects(),
        }
    }
}

impl DevAssistConfig {
    /// Repository root, falling back to the current working directory
    pub fn resolved_repo_path(&self) -> std::io::Result<PathBuf> {
        match &self.repo_path {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir(),
        }
    }

    /// API key if one is configured and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|k| !k.is_empty())
    }
}
