//! HTTP API gateway for ollabot.
//!
//! Routes:
//! - `GET  /api/health`     liveness and agent mode
//! - `GET  /api/models`     models available on the backend
//! - `POST /api/chat`       raw passthrough to the backend, NDJSON
//! - `POST /api/agent/chat` tool-calling agent events, NDJSON
//!
//! Built on Axum; CORS and request tracing come from tower-http.

pub mod api;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use ollabot_agent::AgentStreamer;
use ollabot_config::AppConfig;
use ollabot_core::provider::Provider;
use ollabot_core::tool::ToolRegistry;
use ollabot_providers::OllamaProvider;

/// Shared application state. Read-only after startup.
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn Provider>,
    pub streamer: AgentStreamer,
}

impl GatewayState {
    pub fn new(config: Arc<AppConfig>, provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        let streamer = AgentStreamer::new(provider.clone(), tools, &config.agent);
        Self {
            config,
            provider,
            streamer,
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/api/health", get(api::health_handler))
        .route("/api/models", get(api::models_handler))
        .route("/api/chat", post(api::chat_handler))
        .route("/api/agent/chat", post(api::agent_chat_handler))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS for the configured browser origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Start the gateway HTTP server and serve until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let addr = config.gateway.bind_addr();

    let provider: Arc<dyn Provider> = Arc::new(OllamaProvider::from_config(&config)?);
    let tools = Arc::new(ollabot_tools::default_registry());
    info!(
        backend = %config.ollama.base_url(),
        default_model = %config.default_model,
        agent_mode = config.agent_mode_label(),
        tools = tools.len(),
        "Gateway configured"
    );

    let state = Arc::new(GatewayState::new(config, provider, tools));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
