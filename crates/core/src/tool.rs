//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are small, side-effect free functions the model can ask for:
//! arithmetic, unit conversion, date math, text statistics, encoding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::message::ToolCallRequest;
use crate::provider::ToolDefinition;

/// Prefix that marks a tool result as a failure.
pub const ERROR_PREFIX: &str = "Error:";

/// The result of running one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The tool that produced it
    pub tool_name: String,

    /// Full output text, as fed back to the model
    pub output: String,

    /// Whether the tool executed successfully
    pub success: bool,
}

impl ToolResult {
    /// The output cut to at most `max_chars` characters, for display.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.output.char_indices().nth(max_chars) {
            Some((idx, _)) => self.output[..idx].to_string(),
            None => self.output.clone(),
        }
    }
}

/// The core Tool trait.
///
/// Each built-in tool implements this trait and is registered in the
/// [`ToolRegistry`], which is the only thing the agent loop talks to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments, returning its output text.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// An ordered registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to bind to the model
/// 2. Run tools when the model requests them
///
/// `invoke` and `execute` never fail: tool errors come back as text
/// starting with `Error:` so the model can see them and adapt.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the named tool and return its output, or an `Error: ...` string.
    pub async fn invoke(&self, name: &str, arguments: serde_json::Value) -> String {
        match self.try_invoke(name, arguments).await {
            Ok(output) => output,
            Err(e) => format!("{ERROR_PREFIX} {e}"),
        }
    }

    /// Run a model-requested call.
    pub async fn execute(&self, call: &ToolCallRequest) -> ToolResult {
        let outcome = self.try_invoke(&call.name, call.arguments.clone()).await;
        let (output, success) = match outcome {
            Ok(output) => (output, true),
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
                (format!("{ERROR_PREFIX} {e}"), false)
            }
        };
        ToolResult {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output,
            success,
        }
    }

    async fn try_invoke(&self, name: &str, arguments: serde_json::Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        debug!(tool = name, "Executing tool");
        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
