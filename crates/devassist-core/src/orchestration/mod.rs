//! Tool-calling orchestration
//!
//! Loops model calls and tool executions until the model produces a final
//! text answer.
//!
//! # Example
//!
//! ```no_run
//! use devassist_core::llm::{AnthropicClient, Message};
//! use devassist_core::orchestration::{Orchestrator, OrchestratorSettings};
//! use devassist_core::tools::{RepoRoot, ToolContext, ToolRegistry};
//! use devassist_core::DevAssistConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> devassist_core::Result<()> {
//! let config = DevAssistConfig::default();
//! let ctx = ToolContext {
//!     root: RepoRoot::new(config.resolved_repo_path()?)?,
//!     build: config.build.clone(),
//! };
//! let client = AnthropicClient::from_config(&config.llm)?;
//! let orchestrator = Orchestrator::new(
//!     Arc::new(client),
//!     Arc::new(ToolRegistry::new(ctx)),
//!     OrchestratorSettings::from_config(&config),
//! );
//!
//! let outcome = orchestrator
//!     .handle_conversation_turn(&[Message::user("What changed since the last commit?")])
//!     .await?;
//! println!("{} (tools: {:?})", outcome.text, outcome.tools_used);
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod prompt;
mod types;

pub use orchestrator::Orchestrator;
pub use prompt::build_system_prompt;
pub use types::{OrchestratorSettings, ToolCall, TurnOutcome, TurnState, NO_RESPONSE};
