//! The agent reasoning loop.
//!
//! A run alternates between asking the model and executing the tools it
//! requested:
//!
//! ```text
//! AwaitingModel ──(no tool calls, or cap reached)──▶ Done
//!      │  ▲
//!      ▼  │ (all requested tools executed)
//! AwaitingTools
//! ```
//!
//! The iteration cap is checked only after a model response, so every tool
//! round sits between exactly one preceding and one following model turn.
//! Each [`AgentRun::step`] performs one unit of work (one model call or one
//! tool call) so callers can observe progress as it happens.

use std::collections::VecDeque;
use std::sync::Arc;

use ollabot_core::error::ProviderError;
use ollabot_core::message::{Message, ToolCallRequest};
use ollabot_core::provider::{ChatModel, Provider};
use ollabot_core::tool::{ToolRegistry, ToolResult};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::prompts::system_prompt;
use crate::state::AgentState;

/// Default cap on model invocations per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 2;

/// Unrecoverable failure during a run. Tool failures never end up here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{source}")]
    Model {
        model: String,
        phase: &'static str,
        iteration: u32,
        #[source]
        source: ProviderError,
    },
}

impl AgentError {
    /// Whether the model backend could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Model { source, .. } => source.is_connection_failure(),
        }
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentPhase {
    AwaitingModel,
    AwaitingTools { pending: VecDeque<ToolCallRequest> },
    Done,
}

/// What one call to [`AgentRun::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The model answered. `tool_calls` holds the calls that will now be
    /// executed; it is empty when the run is finishing.
    ModelResponded { tool_calls: Vec<ToolCallRequest> },

    /// One requested tool ran.
    ToolExecuted(ToolResult),

    /// The run had already finished; nothing happened.
    Done,
}

/// Which loop shape a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Bind tools and allow tool rounds up to the iteration cap.
    Tooled,
    /// One model call, no tools.
    Simple,
}

/// Builds agent runs. Shared across requests; holds no per-request state.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    max_iterations: u32,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the maximum number of model invocations per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Start a run over `messages`.
    ///
    /// A tooled run with no registered tools degrades to a simple run: the
    /// tool-aware loop is never built without tools.
    pub fn start(&self, model: &str, mode: LoopMode, messages: Vec<Message>) -> AgentRun {
        if mode == LoopMode::Tooled && !self.tools.is_empty() {
            let definitions = self.tools.definitions();
            let state = AgentState::new(messages, system_prompt(&definitions));
            let chat_model = self.provider.tool_model(model, definitions);
            info!(model, tools = self.tools.len(), max_iterations = self.max_iterations, "Starting agent run");
            AgentRun::new(chat_model, Some(self.tools.clone()), self.max_iterations, state)
        } else {
            if mode == LoopMode::Tooled {
                info!(model, "No tools registered, running in simple mode");
            }
            let state = AgentState::new(messages, system_prompt(&[]));
            let chat_model = self.provider.simple_model(model);
            info!(model, "Starting simple run");
            AgentRun::new(chat_model, None, 1, state)
        }
    }

    /// Start a run and drive it to completion.
    pub async fn run(
        &self,
        model: &str,
        mode: LoopMode,
        messages: Vec<Message>,
    ) -> Result<AgentState, AgentError> {
        self.start(model, mode, messages).run_to_completion().await
    }
}

/// One request's execution. Exclusively owns its [`AgentState`].
pub struct AgentRun {
    model: Arc<dyn ChatModel>,
    tools: Option<Arc<ToolRegistry>>,
    max_iterations: u32,
    state: AgentState,
    phase: AgentPhase,
}

impl AgentRun {
    fn new(
        model: Arc<dyn ChatModel>,
        tools: Option<Arc<ToolRegistry>>,
        max_iterations: u32,
        state: AgentState,
    ) -> Self {
        Self {
            model,
            tools,
            max_iterations,
            state,
            phase: AgentPhase::AwaitingModel,
        }
    }

    pub fn phase(&self) -> &AgentPhase {
        &self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == AgentPhase::Done
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn into_state(self) -> AgentState {
        self.state
    }

    /// Perform one transition. A model failure ends the run.
    pub async fn step(&mut self) -> Result<Step, AgentError> {
        match std::mem::replace(&mut self.phase, AgentPhase::Done) {
            AgentPhase::AwaitingModel => self.call_model().await,
            AgentPhase::AwaitingTools { pending } => self.run_next_tool(pending).await,
            AgentPhase::Done => Ok(Step::Done),
        }
    }

    pub async fn run_to_completion(mut self) -> Result<AgentState, AgentError> {
        while self.step().await? != Step::Done {}
        Ok(self.state)
    }

    async fn call_model(&mut self) -> Result<Step, AgentError> {
        let iteration = self.state.begin_iteration();
        debug!(
            model = %self.model.model_name(),
            iteration,
            messages = self.state.messages().len(),
            "Agent loop iteration"
        );

        let response = match self.model.complete(self.state.messages()).await {
            Ok(response) => response,
            Err(source) => {
                error!(
                    model = %self.model.model_name(),
                    phase = "model_call",
                    iteration,
                    error = %source,
                    "Model call failed"
                );
                return Err(AgentError::Model {
                    model: self.model.model_name().to_string(),
                    phase: "model_call",
                    iteration,
                    source,
                });
            }
        };

        let calls = response.tool_calls().to_vec();
        self.state.push_message(response.into_message());

        if calls.is_empty() || self.tools.is_none() {
            debug!(iteration, "Model answered without tool calls");
            return Ok(Step::ModelResponded { tool_calls: Vec::new() });
        }
        if iteration >= self.max_iterations {
            warn!(
                iteration,
                requested = calls.len(),
                "Max iterations reached, ignoring requested tool calls"
            );
            return Ok(Step::ModelResponded { tool_calls: Vec::new() });
        }

        debug!(tool_count = calls.len(), "Executing tool calls");
        self.phase = AgentPhase::AwaitingTools {
            pending: calls.iter().cloned().collect(),
        };
        Ok(Step::ModelResponded { tool_calls: calls })
    }

    async fn run_next_tool(
        &mut self,
        mut pending: VecDeque<ToolCallRequest>,
    ) -> Result<Step, AgentError> {
        let (Some(call), Some(tools)) = (pending.pop_front(), self.tools.as_ref()) else {
            return self.call_model().await;
        };

        let result = tools.execute(&call).await;
        self.state
            .push_message(Message::tool_result(&call, result.output.clone()));
        self.state.push_tool_result(result.clone());

        self.phase = if pending.is_empty() {
            AgentPhase::AwaitingModel
        } else {
            AgentPhase::AwaitingTools { pending }
        };
        Ok(Step::ToolExecuted(result))
    }
}
