//! The bounded tool-calling agent loop.
//!
//! A run follows an **Ask → Act** cycle:
//!
//! 1. **Prepare** the conversation (system prompt prepended once)
//! 2. **Ask** the model, with tool schemas bound
//! 3. **If tool calls** and the iteration cap allows: run them one by one,
//!    append the results, go back to step 2
//! 4. **Otherwise** the last assistant message is the answer
//!
//! [`AgentStreamer`] drives a run on its own task and turns every
//! transition into an [`AgentStreamEvent`] for the client.

pub mod loop_runner;
pub mod prompts;
pub mod state;
pub mod stream_event;
pub mod streamer;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentError, AgentLoop, AgentPhase, AgentRun, LoopMode, Step};
pub use prompts::system_prompt;
pub use state::AgentState;
pub use stream_event::AgentStreamEvent;
pub use streamer::{AgentRequest, AgentStreamer, ToolChoice};
