//! # ollabot core
//!
//! Domain types, traits, and error definitions for the ollabot agent backend.
//! This crate has **no HTTP dependencies**: it defines the model that the
//! provider, tool, agent and gateway crates implement against.
//!
//! Every seam is a trait here (`ChatModel`, `Provider`, `Tool`) so that
//! tests can swap in scripted implementations without touching the network.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use message::{Message, Role, ToolCallRequest};
pub use provider::{ChatModel, ModelResponse, Provider, RawChatStream, ToolDefinition};
pub use tool::{Tool, ToolRegistry, ToolResult};
