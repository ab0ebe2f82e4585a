//! Per-request agent state.

use ollabot_core::message::{Message, Role};
use ollabot_core::tool::ToolResult;

/// The unit of execution threaded through one agent run.
///
/// `messages` and `tool_results` are append-only. A system prompt is
/// prepended exactly once, at construction, when the caller sent none.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    messages: Vec<Message>,
    tool_results: Vec<ToolResult>,
    iteration_count: u32,
}

impl AgentState {
    pub fn new(mut messages: Vec<Message>, system_prompt: impl Into<String>) -> Self {
        if !messages.iter().any(|m| m.role == Role::System) {
            messages.insert(0, Message::system(system_prompt));
        }
        Self {
            messages,
            tool_results: Vec::new(),
            iteration_count: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Tool results in execution order, with full output.
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.tool_results
    }

    /// Number of model invocations so far.
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Content of the last assistant message, or empty if the model never answered.
    pub fn final_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn push_tool_result(&mut self, result: ToolResult) {
        self.tool_results.push(result);
    }

    pub(crate) fn begin_iteration(&mut self) -> u32 {
        self.iteration_count += 1;
        self.iteration_count
    }
}
