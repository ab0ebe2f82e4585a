//! Event streamer: runs an agent loop on its own task and projects each
//! transition into [`AgentStreamEvent`]s as it happens.
//!
//! Per run the order is: one `status`, then `tool_call`/`tool_result`
//! events in model-turn order, then one `message`, then `done`. A failure
//! emits a single `error` and ends the stream.

use std::sync::Arc;

use ollabot_config::AgentConfig;
use ollabot_core::message::Message;
use ollabot_core::provider::Provider;
use ollabot_core::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::loop_runner::{AgentLoop, AgentRun, LoopMode, Step};
use crate::stream_event::{AgentStreamEvent, STATUS_AGENT_MODE, STATUS_SIMPLE_MODE};

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// The caller's preference for tool use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    /// Treated like `Auto`; the model still decides.
    Required,
    /// Never bind tools.
    None,
}

/// One agent chat request, already converted to domain messages.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tool_choice: ToolChoice,
}

/// Shared across requests; each [`stream`](Self::stream) call gets its own run.
pub struct AgentStreamer {
    agent: AgentLoop,
    agent_enabled: bool,
}

impl AgentStreamer {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AgentConfig) -> Self {
        Self {
            agent: AgentLoop::new(provider, tools).with_max_iterations(config.max_iterations),
            agent_enabled: config.enabled,
        }
    }

    pub fn agent_enabled(&self) -> bool {
        self.agent_enabled
    }

    fn mode_for(&self, tool_choice: ToolChoice) -> LoopMode {
        if self.agent_enabled && tool_choice != ToolChoice::None {
            LoopMode::Tooled
        } else {
            LoopMode::Simple
        }
    }

    /// Start a run and return its event stream.
    ///
    /// Dropping the receiver cancels the run: the in-flight model call is
    /// abandoned and no further events are produced.
    pub fn stream(&self, request: AgentRequest) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mode = self.mode_for(request.tool_choice);
        let status = match mode {
            LoopMode::Tooled => STATUS_AGENT_MODE,
            LoopMode::Simple => STATUS_SIMPLE_MODE,
        };
        info!(
            model = %request.model,
            mode = status,
            messages = request.messages.len(),
            "Agent chat request"
        );
        let run = self.agent.start(&request.model, mode, request.messages);

        tokio::spawn(drive(run, status, tx));
        rx
    }
}

async fn drive(mut run: AgentRun, status: &'static str, tx: mpsc::Sender<AgentStreamEvent>) {
    if tx.send(AgentStreamEvent::status(status)).await.is_err() {
        return;
    }

    loop {
        let step = tokio::select! {
            biased;
            step = run.step() => step,
            _ = tx.closed() => {
                debug!("Client disconnected, abandoning agent run");
                return;
            }
        };

        let events: Vec<AgentStreamEvent> = match step {
            Ok(Step::ModelResponded { tool_calls }) => {
                tool_calls.iter().map(AgentStreamEvent::tool_call).collect()
            }
            Ok(Step::ToolExecuted(result)) => vec![AgentStreamEvent::tool_result(&result)],
            Ok(Step::Done) => break,
            Err(e) => vec![AgentStreamEvent::error(&e)],
        };

        for event in events {
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() {
                debug!("Client disconnected, stopping event stream");
                return;
            }
            if terminal {
                return;
            }
        }
    }

    let state = run.into_state();
    debug!(
        iterations = state.iteration_count(),
        tool_calls = state.tool_results().len(),
        "Agent run complete"
    );
    for event in [
        AgentStreamEvent::message(state.final_content()),
        AgentStreamEvent::done(),
    ] {
        if tx.send(event).await.is_err() {
            return;
        }
    }
}
