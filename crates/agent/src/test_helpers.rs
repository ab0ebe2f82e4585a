//! Shared test helpers for agent tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ollabot_core::error::{ProviderError, ToolError};
use ollabot_core::message::{Message, ToolCallRequest};
use ollabot_core::provider::{ChatModel, ModelResponse, Provider, RawChatStream, ToolDefinition};
use ollabot_core::tool::{Tool, ToolRegistry};

/// A model that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the messages it was sent. Panics if the script runs out.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every message list the model was called with, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(messages.to_vec());
            requests.len()
        };
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedModel: no response scripted for call #{call}"))
    }
}

/// Which model shape a run asked the provider for.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Simple,
    Tools(Vec<String>),
}

/// A provider whose simple and tool-bound models share one script.
pub struct ScriptedProvider {
    model: Arc<dyn ChatModel>,
    bindings: Mutex<Vec<Binding>>,
}

impl ScriptedProvider {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            bindings: Mutex::new(Vec::new()),
        }
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn simple_model(&self, _model: &str) -> Arc<dyn ChatModel> {
        self.bindings.lock().unwrap().push(Binding::Simple);
        self.model.clone()
    }

    fn tool_model(&self, _model: &str, tools: Vec<ToolDefinition>) -> Arc<dyn ChatModel> {
        let names = tools.into_iter().map(|t| t.name).collect();
        self.bindings.lock().unwrap().push(Binding::Tools(names));
        self.model.clone()
    }

    async fn list_models(&self) -> Result<Vec<serde_json::Value>, ProviderError> {
        Ok(Vec::new())
    }

    async fn stream_chat(&self, _body: serde_json::Value) -> Result<RawChatStream, ProviderError> {
        Err(ProviderError::NotConfigured("scripted provider does not stream".into()))
    }
}

/// A model that never answers. Sets `dropped` when its in-flight call is abandoned.
pub struct HangingModel {
    pub dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ChatModel for HangingModel {
    fn model_name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _messages: &[Message]) -> Result<ModelResponse, ProviderError> {
        let _flag = DropFlag(self.dropped.clone());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ModelResponse::text("too late"))
    }
}

/// A tool whose output is `len` copies of `x`.
pub struct LongOutputTool {
    pub len: usize,
}

#[async_trait::async_trait]
impl Tool for LongOutputTool {
    fn name(&self) -> &str {
        "long_output"
    }
    fn description(&self) -> &str {
        "Produces a long string"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
        Ok("x".repeat(self.len))
    }
}

pub fn text(content: &str) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse::text(content))
}

pub fn tool_request(calls: Vec<ToolCallRequest>) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse::ToolRequest {
        content: String::new(),
        calls,
    })
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(id, name, args)
}

pub fn builtin_tools() -> Arc<ToolRegistry> {
    Arc::new(ollabot_tools::default_registry())
}

pub fn scripted(
    responses: Vec<Result<ModelResponse, ProviderError>>,
) -> (Arc<ScriptedModel>, Arc<ScriptedProvider>) {
    let model = Arc::new(ScriptedModel::new(responses));
    let provider = Arc::new(ScriptedProvider::new(model.clone()));
    (model, provider)
}
