//! Model client traits: the abstraction over the LLM backend.
//!
//! A [`Provider`] knows how to reach a backend. It hands out [`ChatModel`]s
//! in two shapes: a *simple* model that only ever answers with text, and a
//! *tool-bound* model that carries tool schemas and may answer with
//! tool-call requests. Binding tools changes the output grammar the model is
//! prompted with, so the two are separate constructors rather than a flag.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ProviderError;
use crate::message::{Message, ToolCallRequest};

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// What a model turn produced. Decided once, at the model boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Plain text reply.
    Text { content: String },

    /// The model wants tools run. `content` is often empty.
    ToolRequest {
        content: String,
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } | Self::ToolRequest { content, .. } => content,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Text { .. } => &[],
            Self::ToolRequest { calls, .. } => calls,
        }
    }

    /// Convert into the assistant message appended to the conversation.
    pub fn into_message(self) -> Message {
        match self {
            Self::Text { content } => Message::assistant(content),
            Self::ToolRequest { content, calls } => {
                Message::assistant_with_tool_calls(content, calls)
            }
        }
    }
}

/// Raw response lines from a streaming chat call, in arrival order.
pub type RawChatStream = tokio::sync::mpsc::Receiver<Result<String, ProviderError>>;

/// A chat-completion model with a fixed configuration.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The backend model name (e.g. "qwen3:8b").
    fn model_name(&self) -> &str;

    /// Send the full message history and get one reply.
    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse, ProviderError>;
}

/// The model backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "ollama").
    fn name(&self) -> &str;

    /// A text-only model. Never returns `ModelResponse::ToolRequest`.
    fn simple_model(&self, model: &str) -> Arc<dyn ChatModel>;

    /// A model with `tools` bound to every request.
    fn tool_model(&self, model: &str, tools: Vec<ToolDefinition>) -> Arc<dyn ChatModel>;

    /// List the models the backend has available, as the backend describes them.
    async fn list_models(&self) -> Result<Vec<serde_json::Value>, ProviderError>;

    /// Forward a chat request body verbatim and stream the raw response lines.
    async fn stream_chat(&self, body: serde_json::Value) -> Result<RawChatStream, ProviderError>;
}
