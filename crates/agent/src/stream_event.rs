//! Agent-level streaming events.
//!
//! `AgentStreamEvent` is what the gateway forwards to clients, one JSON
//! object per line:
//! - `status`      which mode the run is in
//! - `tool_call`   the model asked for a tool
//! - `tool_result` a tool finished (output truncated for display)
//! - `message`     the final assistant answer
//! - `done`        the stream is complete
//! - `error`       the run failed; nothing follows

use ollabot_core::message::ToolCallRequest;
use ollabot_core::tool::ToolResult;
use serde::{Deserialize, Serialize};

use crate::loop_runner::AgentError;

/// Maximum characters of tool output surfaced in a `tool_result` event.
pub const RESULT_DISPLAY_LIMIT: usize = 500;

pub const STATUS_AGENT_MODE: &str = "Agent mode activated";
pub const STATUS_SIMPLE_MODE: &str = "Simple chat mode";

/// Events emitted by the agent during streaming execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Phase description, once at the start of a run.
    Status { content: String },

    /// The agent is calling a tool.
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },

    /// Tool execution completed.
    ToolResult { tool: String, result: String },

    /// The final assistant content.
    Message { content: String },

    /// The stream is complete.
    Done { complete: bool },

    /// The run failed.
    Error { content: String },
}

impl AgentStreamEvent {
    pub fn status(content: impl Into<String>) -> Self {
        Self::Status {
            content: content.into(),
        }
    }

    pub fn tool_call(call: &ToolCallRequest) -> Self {
        Self::ToolCall {
            tool: call.name.clone(),
            args: call.arguments.clone(),
        }
    }

    pub fn tool_result(result: &ToolResult) -> Self {
        Self::ToolResult {
            tool: result.tool_name.clone(),
            result: result.preview(RESULT_DISPLAY_LIMIT),
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    pub fn done() -> Self {
        Self::Done { complete: true }
    }

    pub fn error(err: &AgentError) -> Self {
        Self::Error {
            content: format!("Agent error: {err}"),
        }
    }

    /// Event name, as it appears in the `type` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Message { .. } => "message",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether nothing may follow this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Serialize as one newline-terminated JSON line.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ollabot_core::error::ProviderError;

    #[test]
    fn event_serialization_status() {
        let json = serde_json::to_string(&AgentStreamEvent::status(STATUS_AGENT_MODE)).unwrap();
        assert_eq!(json, r#"{"type":"status","content":"Agent mode activated"}"#);
    }

    #[test]
    fn event_serialization_tool_call() {
        let call = ToolCallRequest::new("c1", "calculator", serde_json::json!({"expression": "2+2"}));
        let json = serde_json::to_value(AgentStreamEvent::tool_call(&call)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "tool_call", "tool": "calculator", "args": {"expression": "2+2"}})
        );
    }

    #[test]
    fn tool_result_is_truncated_for_display() {
        let result = ToolResult {
            call_id: "c1".into(),
            tool_name: "text_analyzer".into(),
            output: "a".repeat(RESULT_DISPLAY_LIMIT + 100),
            success: true,
        };
        match AgentStreamEvent::tool_result(&result) {
            AgentStreamEvent::ToolResult { tool, result: shown } => {
                assert_eq!(tool, "text_analyzer");
                assert_eq!(shown.len(), RESULT_DISPLAY_LIMIT);
            }
            other => panic!("Wrong variant: {other:?}"),
        }
        // The full output is untouched
        assert_eq!(result.output.len(), RESULT_DISPLAY_LIMIT + 100);
    }

    #[test]
    fn done_and_error_lines() {
        assert_eq!(
            AgentStreamEvent::done().to_ndjson_line().unwrap(),
            "{\"type\":\"done\",\"complete\":true}\n"
        );

        let err = AgentError::Model {
            model: "qwen3:8b".into(),
            phase: "model_call",
            iteration: 1,
            source: ProviderError::Timeout("30s".into()),
        };
        let event = AgentStreamEvent::error(&err);
        assert_eq!(
            event,
            AgentStreamEvent::Error {
                content: "Agent error: Request timed out: 30s".into()
            }
        );
        assert!(event.is_terminal());
    }

    #[test]
    fn event_type_names() {
        assert_eq!(AgentStreamEvent::status("x").event_type(), "status");
        assert_eq!(AgentStreamEvent::message("x").event_type(), "message");
        assert_eq!(AgentStreamEvent::done().event_type(), "done");
        assert!(!AgentStreamEvent::message("x").is_terminal());
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"message","content":"hi"}"#;
        let event: AgentStreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, AgentStreamEvent::message("hi"));
    }
}
