//! Route handlers and wire types for the chat API.
//!
//! Both chat routes answer with newline-delimited JSON. Errors on the chat
//! routes are reported in-band as a JSON line, never as an HTTP status.

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use ollabot_agent::{AgentRequest, AgentStreamEvent, ToolChoice};
use ollabot_core::error::ProviderError;
use ollabot_core::message::{Message, Role};

use crate::SharedState;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

// ── Wire types ────────────────────────────────────────────────────────────

/// A message as clients send it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// `POST /api/chat` body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

/// `POST /api/agent/chat` body.
#[derive(Debug, Deserialize)]
pub struct AgentChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tool_choice: ToolChoice,
    /// Accepted for compatibility; agent responses are always streamed.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

/// The body forwarded to the model backend by the passthrough route.
#[derive(Debug, Serialize)]
struct BackendChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub agent_mode: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `GET /api/health`
pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: "ollabot server running".into(),
        agent_mode: state.config.agent_mode_label().into(),
    })
}

/// `GET /api/models`: backend failures are reported in the body.
pub async fn models_handler(State(state): State<SharedState>) -> Json<ModelsResponse> {
    match state.provider.list_models().await {
        Ok(models) => Json(ModelsResponse {
            models,
            error: None,
        }),
        Err(e) => {
            error!(error = %e, "Failed to fetch models");
            Json(ModelsResponse {
                models: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// `POST /api/chat`: stream the backend's raw response lines through.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let model = payload
        .model
        .as_deref()
        .unwrap_or(&state.config.default_model);
    info!(model, messages = payload.messages.len(), "/api/chat request received");

    let body = BackendChatBody {
        model,
        messages: &payload.messages,
        stream: payload.stream,
    };
    let body = match serde_json::to_value(&body) {
        Ok(body) => body,
        Err(e) => {
            return ndjson_response(tokio_stream::once(error_line(&format!(
                "An unexpected error occurred: {e}"
            ))));
        }
    };

    match state.provider.stream_chat(body).await {
        Ok(rx) => {
            let lines = ReceiverStream::new(rx).map(|item| match item {
                Ok(mut line) => {
                    line.push('\n');
                    line
                }
                Err(e) => {
                    warn!(error = %e, "Passthrough stream failed");
                    error_line(&format!("An unexpected error occurred: {e}"))
                }
            });
            ndjson_response(lines)
        }
        Err(e) => {
            let message = passthrough_error_message(&e, &state.config.ollama.chat_url());
            error!(model, error = %e, "Passthrough request failed");
            ndjson_response(tokio_stream::once(error_line(&message)))
        }
    }
}

/// `POST /api/agent/chat`: stream agent events.
pub async fn agent_chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AgentChatRequest>,
) -> Response {
    let model = payload
        .model
        .unwrap_or_else(|| state.config.default_model.clone());
    info!(
        model = %model,
        tool_choice = ?payload.tool_choice,
        messages = payload.messages.len(),
        "/api/agent/chat request received"
    );
    if !payload.stream {
        debug!("Non-streaming agent request, responding with a stream anyway");
    }

    let rx = state.streamer.stream(AgentRequest {
        model,
        messages: to_domain_messages(payload.messages),
        tool_choice: payload.tool_choice,
    });

    let lines = ReceiverStream::new(rx).filter_map(|event: AgentStreamEvent| {
        match event.to_ndjson_line() {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(error = %e, event = event.event_type(), "Failed to serialize agent event");
                None
            }
        }
    });
    ndjson_response(lines)
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// Keep user, assistant and system messages, in order.
pub fn to_domain_messages(incoming: Vec<ChatMessage>) -> Vec<Message> {
    incoming
        .into_iter()
        .filter_map(|m| match Role::parse(&m.role) {
            Some(Role::User) => Some(Message::user(m.content)),
            Some(Role::Assistant) => Some(Message::assistant(m.content)),
            Some(Role::System) => Some(Message::system(m.content)),
            Some(Role::Tool) | None => {
                warn!(role = %m.role, "Skipping message with unsupported role");
                None
            }
        })
        .collect()
}

/// Client-facing text for a failed passthrough request.
pub fn passthrough_error_message(err: &ProviderError, chat_url: &str) -> String {
    match err {
        ProviderError::Connection { .. } => {
            format!("Error: Could not connect to Ollama at {chat_url}")
        }
        ProviderError::ApiError { status_code, .. } => format!("Error: HTTP {status_code}"),
        other => format!("An unexpected error occurred: {other}"),
    }
}

fn error_line(message: &str) -> String {
    let mut line = serde_json::json!({ "error": message }).to_string();
    line.push('\n');
    line
}

fn ndjson_response<S>(lines: S) -> Response
where
    S: Stream<Item = String> + Send + 'static,
{
    let body = Body::from_stream(lines.map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}
