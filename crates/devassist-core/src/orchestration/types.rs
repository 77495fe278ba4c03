//! Orchestration types
//!
//! Defines the values that flow through one conversation turn.

use crate::config::DevAssistConfig;
use crate::llm::{ContentBlock, MessageResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Literal answer used when the final model response has no text block
pub const NO_RESPONSE: &str = "No response";

/// A tool invocation extracted from a `tool_use` block
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

impl ToolCall {
    /// Every tool invocation the model asked for, in response order
    pub fn from_response(response: &MessageResponse) -> Vec<ToolCall> {
        response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Result of a completed conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Final assistant text
    pub text: String,

    /// Names of the tools invoked across all iterations, in call order
    pub tools_used: Vec<String>,
}

/// Where a conversation turn currently is
#[derive(Debug)]
pub enum TurnState {
    /// Next step is a model call
    AwaitingModel,
    /// The model asked for tools
    ExecutingTools(MessageResponse),
    /// The model produced its final answer
    Completed(MessageResponse),
    /// A loop bound was hit
    Aborted(String),
}

/// Knobs for the tool-calling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Upper bound on model calls per turn
    pub max_iterations: usize,
    /// Wall-clock budget for a whole turn
    pub turn_budget: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &DevAssistConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            max_iterations: config.orchestrator.max_iterations,
            turn_budget: Duration::from_secs(config.orchestrator.turn_budget_secs),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&DevAssistConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StopReason;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tool_calls_keep_order_and_skip_text() {
        let response = MessageResponse {
            id: "msg_1".to_string(),
            content: vec![
                ContentBlock::text("Let me look."),
                ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "git_status".to_string(),
                    input: json!({}),
                },
                ContentBlock::ToolUse {
                    id: "toolu_2".to_string(),
                    name: "read_file".to_string(),
                    input: json!({"path": "README.md"}),
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
        };

        let calls = ToolCall::from_response(&response);
        let ids: Vec<_> = calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["toolu_1", "toolu_2"]);
        assert_eq!(calls[1].input, json!({"path": "README.md"}));
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.max_iterations, 25);
        assert_eq!(settings.turn_budget, Duration::from_secs(600));
        assert_eq!(settings.max_tokens, 4096);
    }
}
