//! Tool-calling orchestrator
//!
//! Drives one conversation turn: call the model, run whatever tools it asks
//! for, feed the results back, and repeat until it answers in text. The loop
//! is bounded by an iteration cap and a wall-clock budget.

use super::prompt::build_system_prompt;
use super::types::{OrchestratorSettings, ToolCall, TurnOutcome, TurnState, NO_RESPONSE};
use crate::error::{DevAssistError, Result};
use crate::llm::{ContentBlock, Message, MessageRequest, ModelClient, Role};
use crate::tools::{ToolDefinition, ToolRegistry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs conversation turns against a model and the tool registry
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    settings: OrchestratorSettings,
    system_prompt: String,
    definitions: Vec<ToolDefinition>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        settings: OrchestratorSettings,
    ) -> Self {
        let system_prompt = build_system_prompt(tools.context());
        let definitions = tools.definitions();
        Self {
            client,
            tools,
            settings,
            system_prompt,
            definitions,
        }
    }

    /// Tool definitions sent to the model with every request
    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Answer the last user message in `history`, running tools as needed
    ///
    /// The caller's history is never modified. Tool failures are handed to
    /// the model as text; only model failures and loop bounds fail the turn.
    pub async fn handle_conversation_turn(&self, history: &[Message]) -> Result<TurnOutcome> {
        if history.is_empty() {
            return Err(DevAssistError::invalid_request(
                "messages must contain at least one message",
            ));
        }

        let turn_id = Uuid::new_v4();
        self.run_turn(history)
            .instrument(info_span!("turn", %turn_id))
            .await
    }

    async fn run_turn(&self, history: &[Message]) -> Result<TurnOutcome> {
        let started = Instant::now();
        let mut working = history.to_vec();
        let mut tools_used = Vec::new();
        let mut iterations = 0;
        let mut state = TurnState::AwaitingModel;

        info!(messages = history.len(), "Conversation turn started");

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    let elapsed = started.elapsed();
                    if iterations >= self.settings.max_iterations {
                        TurnState::Aborted(format!(
                            "model still requesting tools after {} calls",
                            iterations
                        ))
                    } else if elapsed >= self.settings.turn_budget {
                        TurnState::Aborted(format!(
                            "turn exceeded its {}s budget",
                            self.settings.turn_budget.as_secs()
                        ))
                    } else {
                        iterations += 1;
                        let request = self.request(&working);
                        info!(iteration = iterations, messages = working.len(), "Calling model");

                        let remaining = self.settings.turn_budget - elapsed;
                        match tokio::time::timeout(remaining, self.client.create_message(&request))
                            .await
                        {
                            Ok(response) => {
                                let response = response?;
                                debug!(stop_reason = ?response.stop_reason, blocks = response.content.len(), "Model responded");
                                if response.wants_tools() {
                                    TurnState::ExecutingTools(response)
                                } else {
                                    TurnState::Completed(response)
                                }
                            }
                            Err(_) => TurnState::Aborted(format!(
                                "turn exceeded its {}s budget",
                                self.settings.turn_budget.as_secs()
                            )),
                        }
                    }
                }

                TurnState::ExecutingTools(response) => {
                    let calls = ToolCall::from_response(&response);
                    if calls.is_empty() {
                        TurnState::Completed(response)
                    } else {
                        let results = self.execute_tools(&calls).await;
                        tools_used.extend(calls.into_iter().map(|c| c.name));
                        working.push(Message::with_blocks(Role::Assistant, response.content));
                        working.push(Message::with_blocks(Role::User, results));
                        TurnState::AwaitingModel
                    }
                }

                TurnState::Completed(response) => {
                    let text = response.first_text().unwrap_or(NO_RESPONSE).to_string();
                    info!(
                        iterations,
                        tools = tools_used.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Conversation turn completed"
                    );
                    return Ok(TurnOutcome { text, tools_used });
                }

                TurnState::Aborted(reason) => {
                    warn!(iterations, tools = tools_used.len(), %reason, "Conversation turn aborted");
                    return Err(DevAssistError::aborted(reason));
                }
            };
        }
    }

    fn request(&self, messages: &[Message]) -> MessageRequest {
        MessageRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            system: self.system_prompt.clone(),
            tools: self.definitions.clone(),
            messages: messages.to_vec(),
        }
    }

    /// Run all calls concurrently; one `tool_result` per call, same order
    async fn execute_tools(&self, calls: &[ToolCall]) -> Vec<ContentBlock> {
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        info!(count = calls.len(), tools = ?names, "Executing tools");

        let outputs = join_all(
            calls
                .iter()
                .map(|call| self.tools.execute(&call.name, &call.input)),
        )
        .await;

        calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| ContentBlock::ToolResult {
                tool_use_id: call.id.clone(),
                content: output.content,
                is_error: output.is_error,
            })
            .collect()
    }
}
