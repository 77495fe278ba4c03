//! Devassist Core - backend library for the development assistant
//!
//! This crate provides everything except the HTTP surface:
//! - Configuration loading
//! - Anthropic Messages API types and client
//! - The nine repository tools and their registry
//! - The tool-calling orchestrator
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  history   ┌──────────────┐  request   ┌──────────────┐
//! │  HTTP route  │ ─────────→ │ Orchestrator │ ─────────→ │ ModelClient  │
//! │              │ ←───────── │              │ ←───────── │              │
//! └──────────────┘  outcome   └──────┬───────┘  response  └──────────────┘
//!                                    │ tool calls
//!                             ┌──────▼───────┐
//!                             │ ToolRegistry │ ── RepoRoot
//!                             └──────────────┘
//! ```

pub mod config;
pub mod error;

// Model integration
pub mod llm;

// Repository tools
pub mod tools;

// Tool-calling loop
pub mod orchestration;

pub use config::{load_config, DevAssistConfig};
pub use error::{DevAssistError, Result};
pub use llm::{AnthropicClient, LlmError, Message, ModelClient};
pub use orchestration::{Orchestrator, OrchestratorSettings, TurnOutcome};
pub use tools::{RepoRoot, ToolContext, ToolRegistry};

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
