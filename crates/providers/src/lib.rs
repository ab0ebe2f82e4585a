//! Model backend implementations for ollabot.
//!
//! All backends implement the `ollabot_core::Provider` trait. The only
//! backend today is a local Ollama runtime spoken to over its native HTTP API.

pub mod ollama;

pub use ollama::{OllamaChatModel, OllamaProvider};
