//! `ollabot models`: List models available on the Ollama backend.

use ollabot_config::AppConfig;
use ollabot_core::provider::Provider;
use ollabot_providers::OllamaProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let provider = OllamaProvider::from_config(&config)?;

    let models = provider.list_models().await?;
    println!("🦙 Models at {} ({})", provider.base_url(), models.len());
    println!("==================");
    for model in &models {
        let marker = if model_name(model) == Some(config.default_model.as_str()) {
            "*"
        } else {
            " "
        };
        println!(" {marker} {}", model_line(model));
    }
    if models.is_empty() {
        println!("  No models installed — try `ollama pull {}`", config.default_model);
    }

    Ok(())
}

fn model_name(model: &serde_json::Value) -> Option<&str> {
    model.get("name").and_then(|n| n.as_str())
}

fn model_line(model: &serde_json::Value) -> String {
    let name = model_name(model).unwrap_or("<unnamed>");
    match model.get("size").and_then(|s| s.as_u64()) {
        Some(bytes) => format!("{name:<30} {:.1} GB", bytes as f64 / 1e9),
        None => name.to_string(),
    }
}
