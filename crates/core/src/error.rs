//! Error types for the ollabot domain.
//!
//! Each bounded context has its own `thiserror` enum. Callers that need
//! a single error type box these (`Box<dyn Error>`) at the binary edge.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures talking to the model backend.
///
/// `Connection` is the "backend unreachable" condition; every other variant
/// is a model failure (the backend answered, but not usefully).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not connect to model backend at {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Invalid response from model backend: {0}")]
    InvalidResponse(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the backend could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Failures inside a tool. These never leave the `ToolRegistry`; they are
/// rendered into `Error: ...` result text for the model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("unknown tool {0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}
