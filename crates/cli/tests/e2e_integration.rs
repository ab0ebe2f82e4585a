//! End-to-end tests for the ollabot HTTP backend.
//!
//! These wire a wiremock Ollama server to the real provider, the default
//! tool registry and the gateway router, then read the NDJSON responses.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ollabot_config::AppConfig;
use ollabot_gateway::{GatewayState, build_router};
use ollabot_providers::OllamaProvider;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ──────────────────────────────────────────────────────────────

fn app(backend_url: &str, config: AppConfig) -> axum::Router {
    let provider = OllamaProvider::new(backend_url, Duration::from_secs(5))
        .unwrap()
        .with_sampling(config.agent.temperature, config.agent.num_predict);
    let tools = Arc::new(ollabot_tools::default_registry());
    build_router(Arc::new(GatewayState::new(
        Arc::new(config),
        Arc::new(provider),
        tools,
    )))
}

async fn post_ndjson(app: axum::Router, uri: &str, body: Value) -> Vec<Value> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/x-ndjson");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_call_reply(content: &str, name: &str, arguments: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "qwen3:8b",
        "message": {
            "role": "assistant",
            "content": content,
            "tool_calls": [{ "function": { "name": name, "arguments": arguments } }]
        },
        "done": true
    }))
}

fn text_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "qwen3:8b",
        "message": { "role": "assistant", "content": content },
        "done": true
    }))
}

async fn sent_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ── Agent chat ───────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_agent_calculator_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(tool_call_reply("", "calculator", json!({"expression": "15 * 23"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(text_reply("15 × 23 = 345"))
        .mount(&server)
        .await;

    let events = post_ndjson(
        app(&server.uri(), AppConfig::default()),
        "/api/agent/chat",
        json!({"messages": [{"role": "user", "content": "What is 15 * 23?"}]}),
    )
    .await;

    assert_eq!(
        events,
        vec![
            json!({"type": "status", "content": "Agent mode activated"}),
            json!({"type": "tool_call", "tool": "calculator", "args": {"expression": "15 * 23"}}),
            json!({"type": "tool_result", "tool": "calculator", "result": "Result: 345"}),
            json!({"type": "message", "content": "15 × 23 = 345"}),
            json!({"type": "done", "complete": true}),
        ]
    );

    let bodies = sent_bodies(&server).await;
    assert_eq!(bodies.len(), 2);

    // First turn: system prompt prepended, tools bound
    let first = &bodies[0];
    assert_eq!(first["model"], "qwen3:8b");
    assert_eq!(first["stream"], false);
    assert_eq!(first["messages"][0]["role"], "system");
    assert_eq!(first["tools"].as_array().unwrap().len(), 7);

    // Second turn carries the tool result tagged with its tool
    let second = bodies[1]["messages"].as_array().unwrap();
    let last = second.last().unwrap();
    assert_eq!(last["role"], "tool");
    assert_eq!(last["content"], "Result: 345");
    assert_eq!(last["tool_name"], "calculator");
}

#[tokio::test]
async fn e2e_iteration_cap_stops_after_one_model_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(tool_call_reply(
            "Let me calculate.",
            "calculator",
            json!({"expression": "1+1"}),
        ))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.agent.max_iterations = 1;
    let events = post_ndjson(
        app(&server.uri(), config),
        "/api/agent/chat",
        json!({"messages": [{"role": "user", "content": "1+1?"}]}),
    )
    .await;

    assert_eq!(
        events,
        vec![
            json!({"type": "status", "content": "Agent mode activated"}),
            json!({"type": "message", "content": "Let me calculate."}),
            json!({"type": "done", "complete": true}),
        ]
    );
    assert_eq!(sent_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn e2e_tool_failure_is_fed_back_to_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(tool_call_reply("", "calculator", json!({"expression": "1/0"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(text_reply("Division by zero is undefined."))
        .mount(&server)
        .await;

    let events = post_ndjson(
        app(&server.uri(), AppConfig::default()),
        "/api/agent/chat",
        json!({"messages": [{"role": "user", "content": "1/0?"}]}),
    )
    .await;

    assert_eq!(events.len(), 5);
    assert_eq!(events[2]["type"], "tool_result");
    assert!(events[2]["result"].as_str().unwrap().starts_with("Error: "));
    assert_eq!(events[3]["content"], "Division by zero is undefined.");
}

#[tokio::test]
async fn e2e_simple_mode_sends_no_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(text_reply("Hi there!"))
        .mount(&server)
        .await;

    let mut config = AppConfig::default();
    config.agent.enabled = false;
    let events = post_ndjson(
        app(&server.uri(), config),
        "/api/agent/chat",
        json!({"messages": [{"role": "user", "content": "Hello"}], "model": "llama3.2"}),
    )
    .await;

    assert_eq!(events[0], json!({"type": "status", "content": "Simple chat mode"}));
    assert_eq!(events[1], json!({"type": "message", "content": "Hi there!"}));
    assert_eq!(events.len(), 3);

    let bodies = sent_bodies(&server).await;
    assert_eq!(bodies[0]["model"], "llama3.2");
    assert!(bodies[0].get("tools").is_none());
}

#[tokio::test]
async fn e2e_backend_down_yields_error_event() {
    let events = post_ndjson(
        app("http://127.0.0.1:1", AppConfig::default()),
        "/api/agent/chat",
        json!({"messages": [{"role": "user", "content": "Hello"}]}),
    )
    .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["type"], "status");
    assert_eq!(events[1]["type"], "error");
    assert!(
        events[1]["content"]
            .as_str()
            .unwrap()
            .starts_with("Agent error: Could not connect")
    );
}

// ── Passthrough and models ───────────────────────────────────────────────

#[tokio::test]
async fn e2e_passthrough_relays_backend_lines() {
    let server = MockServer::start().await;
    let upstream = concat!(
        r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#,
        "\n",
        r#"{"message":{"role":"assistant","content":"lo"},"done":false}"#,
        "\n",
        r#"{"done":true}"#,
        "\n"
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(upstream))
        .mount(&server)
        .await;

    let lines = post_ndjson(
        app(&server.uri(), AppConfig::default()),
        "/api/chat",
        json!({"messages": [{"role": "user", "content": "Hello"}]}),
    )
    .await;

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["message"]["content"], "Hel");
    assert_eq!(lines[1]["message"]["content"], "lo");
    assert_eq!(lines[2]["done"], true);

    let bodies = sent_bodies(&server).await;
    assert_eq!(bodies[0]["stream"], true);
    assert_eq!(bodies[0]["model"], "qwen3:8b");
}

#[tokio::test]
async fn e2e_models_lists_backend_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "qwen3:8b", "size": 5_200_000_000u64}]
        })))
        .mount(&server)
        .await;

    let req = Request::builder()
        .uri("/api/models")
        .body(Body::empty())
        .unwrap();
    let response = app(&server.uri(), AppConfig::default())
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["models"][0]["name"], "qwen3:8b");
    assert!(body.get("error").is_none());
}
