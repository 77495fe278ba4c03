//! LLM integration module
//!
//! Wire types for the Anthropic Messages API with tool calling, and the
//! client that talks to it.

mod client;
mod error;
mod message;

pub use client::{AnthropicClient, MessageRequest, MessageResponse, ModelClient, StopReason};
pub use error::LlmError;
pub use message::{ContentBlock, Message, MessageContent, Role};
