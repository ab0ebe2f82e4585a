//! Ollama provider implementation.
//!
//! Talks to the native Ollama API:
//! - `POST /api/chat` non-streaming for agent turns (optionally with tools)
//! - `POST /api/chat` streaming for the passthrough route (NDJSON lines)
//! - `GET /api/tags` for model listing

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use ollabot_config::AppConfig;
use ollabot_core::error::ProviderError;
use ollabot_core::message::{Message, ToolCallRequest};
use ollabot_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Default sampling temperature for agent turns.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on generated tokens per agent turn.
pub const DEFAULT_NUM_PREDICT: u32 = 512;

/// A local Ollama runtime reached over HTTP.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    temperature: f32,
    num_predict: u32,
}

impl OllamaProvider {
    /// Create a provider for the runtime at `base_url` (e.g. `http://localhost:11434`).
    ///
    /// `timeout` bounds connecting and each read, not a whole streamed response.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            temperature: DEFAULT_TEMPERATURE,
            num_predict: DEFAULT_NUM_PREDICT,
        })
    }

    /// Build from application config, including agent sampling options.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let provider = Self::new(
            config.ollama.base_url(),
            Duration::from_secs(config.ollama.request_timeout_secs),
        )?;
        Ok(provider.with_sampling(config.agent.temperature, config.agent.num_predict))
    }

    /// Override the sampling options sent with agent turns.
    pub fn with_sampling(mut self, temperature: f32, num_predict: u32) -> Self {
        self.temperature = temperature;
        self.num_predict = num_predict;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    fn chat_model(&self, model: &str, tools: Vec<ToolDefinition>) -> OllamaChatModel {
        OllamaChatModel {
            client: self.client.clone(),
            url: self.chat_url(),
            model: model.to_string(),
            num_predict: (!tools.is_empty()).then_some(self.num_predict),
            tools: to_api_tools(&tools),
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn simple_model(&self, model: &str) -> Arc<dyn ChatModel> {
        Arc::new(self.chat_model(model, Vec::new()))
    }

    fn tool_model(&self, model: &str, tools: Vec<ToolDefinition>) -> Arc<dyn ChatModel> {
        Arc::new(self.chat_model(model, tools))
    }

    async fn list_models(&self) -> Result<Vec<serde_json::Value>, ProviderError> {
        let url = self.tags_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_send_error(&url, e))?;
        let response = check_status(response).await?;

        let body: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse model list: {e}")))?;
        Ok(body.models)
    }

    async fn stream_chat(&self, body: serde_json::Value) -> Result<RawChatStream, ProviderError> {
        let url = self.chat_url();
        debug!(url = %url, "Forwarding streaming chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&url, e))?;
        let response = check_status(response).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Forward the NDJSON body line by line, in arrival order
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::default();

            loop {
                let chunk = tokio::select! {
                    biased;
                    chunk = byte_stream.next() => chunk,
                    _ = tx.closed() => {
                        trace!("Passthrough receiver dropped, closing backend stream");
                        return;
                    }
                };

                let (items, finished) = match chunk {
                    Some(Ok(bytes)) => (lines.push(&bytes), false),
                    Some(Err(e)) => (vec![Err(ProviderError::StreamInterrupted(e.to_string()))], true),
                    None => (lines.take_rest().into_iter().collect(), true),
                };

                for item in items {
                    let failed = item.is_err();
                    if tx.send(item).await.is_err() {
                        trace!("Passthrough receiver dropped");
                        return;
                    }
                    if failed {
                        return;
                    }
                }
                if finished {
                    return;
                }
            }
        });

        Ok(rx)
    }
}

/// Splits a byte stream into lines. Bytes are buffered until a newline
/// arrives, so a UTF-8 character split across chunks decodes intact.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed. Blank lines are skipped.
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, ProviderError>> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            lines.extend(decode_line(raw));
        }
        lines
    }

    /// The unterminated tail, once the stream has ended.
    fn take_rest(&mut self) -> Option<Result<String, ProviderError>> {
        decode_line(std::mem::take(&mut self.pending))
    }
}

fn decode_line(raw: Vec<u8>) -> Option<Result<String, ProviderError>> {
    match String::from_utf8(raw) {
        Ok(text) => {
            let line = text.trim_end_matches(['\n', '\r']);
            (!line.trim().is_empty()).then(|| Ok(line.to_string()))
        }
        Err(e) => Some(Err(ProviderError::InvalidResponse(format!(
            "Stream line is not valid UTF-8: {e}"
        )))),
    }
}

/// A configured Ollama chat model. Tool-bound when `tools` is non-empty.
pub struct OllamaChatModel {
    client: reqwest::Client,
    url: String,
    model: String,
    tools: Vec<ApiToolDefinition>,
    temperature: f32,
    /// Output length cap. Only tool-bound models are capped.
    num_predict: Option<u32>,
}

impl OllamaChatModel {
    fn request_body(&self, messages: &[Message]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": to_api_messages(messages),
            "stream": false,
            "options": {
                "temperature": self.temperature,
            },
        });

        if let Some(num_predict) = self.num_predict {
            body["options"]["num_predict"] = serde_json::json!(num_predict);
        }

        if !self.tools.is_empty() {
            body["tools"] = serde_json::json!(self.tools);
        }

        body
    }

    fn is_tool_bound(&self) -> bool {
        !self.tools.is_empty()
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse, ProviderError> {
        let body = self.request_body(messages);
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = self.tools.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&self.url, e))?;
        let response = check_status(response).await?;

        let api_response: ApiChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let content = api_response.message.content;
        let raw_calls = api_response.message.tool_calls;

        if raw_calls.is_empty() {
            return Ok(ModelResponse::Text { content });
        }
        if !self.is_tool_bound() {
            warn!(model = %self.model, "Ignoring tool calls from a model without tools");
            return Ok(ModelResponse::Text { content });
        }

        let calls = raw_calls
            .into_iter()
            .map(ApiToolCall::into_request)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ModelResponse::ToolRequest { content, calls })
    }
}

fn map_send_error(url: &str, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(format!("{url}: {e}"))
    } else {
        ProviderError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %error_body, "Ollama returned error");
    Err(ProviderError::ApiError {
        status_code: status.as_u16(),
        message: error_body,
    })
}

fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
            tool_calls: m
                .tool_calls
                .iter()
                .map(|tc| ApiToolCall {
                    id: Some(tc.id.clone()),
                    function: ApiFunction {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect(),
            tool_name: m.tool_name.clone(),
        })
        .collect()
}

fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
    tools
        .iter()
        .map(|t| ApiToolDefinition {
            r#type: "function".into(),
            function: ApiToolFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            },
        })
        .collect()
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: ApiFunction,
}

impl ApiToolCall {
    fn into_request(self) -> Result<ToolCallRequest, ProviderError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        let arguments = parse_arguments(&self.function.name, self.function.arguments)?;
        Ok(ToolCallRequest::new(id, self.function.name, arguments))
    }
}

/// Ollama sends arguments as an object; some models emit a JSON string instead.
fn parse_arguments(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<serde_json::Value, ProviderError> {
    match arguments {
        serde_json::Value::Null => Ok(serde_json::json!({})),
        serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(serde_json::json!({})),
        serde_json::Value::String(raw) => serde_json::from_str(&raw).map_err(|e| {
            ProviderError::InvalidResponse(format!("Unparseable arguments for tool {tool}: {e}"))
        }),
        other => Ok(other),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<serde_json::Value>,
}
