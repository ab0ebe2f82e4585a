//! Configuration loading, validation, and management for ollabot.
//!
//! Configuration is read exactly once at startup: an optional TOML file
//! (path in `OLLABOT_CONFIG`) provides the base, environment variables
//! override it, and the result is validated. After that the value is
//! immutable and passed explicitly to whoever needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "OLLABOT_CONFIG";

/// The root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model backend connection
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Agent (tool mode) behavior
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "qwen3:8b".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Scheme and host, without port (e.g. "http://localhost")
    #[serde(default = "default_ollama_host")]
    pub host: String,

    #[serde(default = "default_ollama_port")]
    pub port: u16,

    /// Connect + read timeout for every backend call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ollama_host() -> String {
    "http://localhost".into()
}
fn default_ollama_port() -> u16 {
    11434
}
fn default_request_timeout() -> u64 {
    30
}

impl OllamaConfig {
    /// `{host}:{port}`, the root every endpoint hangs off.
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            port: default_ollama_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Whether tool mode is available at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum model calls per agent run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Response length cap for the tool-bound model
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

fn default_true() -> bool {
    true
}
fn default_max_iterations() -> u32 {
    2
}
fn default_temperature() -> f32 {
    0.7
}
fn default_num_predict() -> u32 {
    512
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: default_max_iterations(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".into()]
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Reads the TOML file named by `OLLABOT_CONFIG` (if any), then applies
    /// these overrides:
    /// - `OLLAMA_HOST`, `OLLAMA_PORT`, `OLLAMA_TIMEOUT_SECS`
    /// - `DEFAULT_MODEL`
    /// - `ENABLE_AGENT_MODE` (`true`/`1` enable, anything else disables)
    /// - `MAX_ITERATIONS`
    /// - `OLLABOT_HOST`, `OLLABOT_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(port) = lookup("OLLAMA_PORT") {
            self.ollama.port = parse_env("OLLAMA_PORT", &port)?;
        }
        if let Some(timeout) = lookup("OLLAMA_TIMEOUT_SECS") {
            self.ollama.request_timeout_secs = parse_env("OLLAMA_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(model) = lookup("DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(flag) = lookup("ENABLE_AGENT_MODE") {
            self.agent.enabled = matches!(flag.to_lowercase().as_str(), "true" | "1");
        }
        if let Some(max) = lookup("MAX_ITERATIONS") {
            self.agent.max_iterations = parse_env("MAX_ITERATIONS", &max)?;
        }
        if let Some(host) = lookup("OLLABOT_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("OLLABOT_PORT") {
            self.gateway.port = parse_env("OLLABOT_PORT", &port)?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.ollama.port == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.port must be non-zero".into(),
            ));
        }

        if self.ollama.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ollama.request_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// "enabled" or "disabled", as reported by the health endpoint.
    pub fn agent_mode_label(&self) -> &'static str {
        if self.agent.enabled { "enabled" } else { "disabled" }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            ollama: OllamaConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
