//! Model client for the Anthropic Messages API
//!
//! The orchestrator only sees the [`ModelClient`] trait; [`AnthropicClient`]
//! is the production implementation.

use super::{ContentBlock, LlmError, Message};
use crate::config::LlmConfig;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One request to the model
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub tools: Vec<ToolDefinition>,
    pub messages: Vec<Message>,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// The model's reply to one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
}

impl MessageResponse {
    /// Response consisting of a single text block that ends the turn
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            content: vec![ContentBlock::text(text)],
            stop_reason: Some(StopReason::EndTurn),
        }
    }

    /// True when the model wants tools to be run before it continues
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == Some(StopReason::ToolUse)
    }

    /// First text block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Anything that can answer a [`MessageRequest`]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one request and wait for the complete response
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError>;
}

/// Client for Anthropic's Messages API
pub struct AnthropicClient {
    /// API key
    api_key: String,

    /// Base URL for the API
    base_url: String,

    /// HTTP agent with the configured timeout
    agent: ureq::Agent,
}

impl AnthropicClient {
    /// Create a new client
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Create from the `[llm]` config section
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self::new(api_key, Duration::from_secs(config.timeout))
            .with_base_url(&config.base_url))
    }

    /// Create with a specific base URL (for proxies)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError> {
        let body = serde_json::to_value(request)?;
        let url = format!("{}/v1/messages", self.base_url);
        let api_key = self.api_key.clone();
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || send_messages_request(&agent, &url, &api_key, &body))
            .await
            .map_err(|e| LlmError::Internal(format!("Model request task failed: {}", e)))?
    }
}

/// Send request to the Messages API and decode the full response
fn send_messages_request(
    agent: &ureq::Agent,
    url: &str,
    api_key: &str,
    body: &serde_json::Value,
) -> Result<MessageResponse, LlmError> {
    let response = agent
        .post(url)
        .set("Content-Type", "application/json")
        .set("x-api-key", api_key)
        .set("anthropic-version", ANTHROPIC_VERSION)
        .send_json(body)?;

    let json: serde_json::Value = response.into_json()?;

    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(LlmError::Api {
            status: 500,
            message: message.to_string(),
        });
    }

    serde_json::from_value(json)
        .map_err(|e| LlmError::InvalidResponse(format!("Unexpected Messages API payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_tool_use_response() {
        let response: MessageResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Checking."},
                {"type": "tool_use", "id": "toolu_a", "name": "git_status", "input": {}},
                {"type": "tool_use", "id": "toolu_b", "name": "read_file", "input": {"path": "README.md"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }))
        .unwrap();

        assert!(response.wants_tools());
        assert_eq!(response.first_text(), Some("Checking."));
        assert_eq!(response.content.len(), 3);
    }

    #[test]
    fn test_unknown_stop_reason() {
        let response: MessageResponse = serde_json::from_value(json!({
            "content": [],
            "stop_reason": "pause_turn"
        }))
        .unwrap();
        assert_eq!(response.stop_reason, Some(StopReason::Other));
        assert!(!response.wants_tools());
        assert_eq!(response.first_text(), None);
    }

    #[test]
    fn test_request_serialization() {
        let request = MessageRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            system: "be brief".to_string(),
            tools: vec![],
            messages: vec![Message::user("hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hi"}));
        assert_eq!(value["max_tokens"], json!(4096));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            AnthropicClient::from_config(&config),
            Err(LlmError::MissingApiKey)
        ));
    }
}
