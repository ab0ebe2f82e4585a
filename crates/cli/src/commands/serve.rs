//! `ollabot serve`: Start the HTTP API server.

use ollabot_config::AppConfig;

pub async fn run(
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🦙 ollabot");
    println!("   Listening:  {}", config.gateway.bind_addr());
    println!("   Ollama:     {}", config.ollama.base_url());
    println!("   Model:      {}", config.default_model);
    println!(
        "   Agent mode: {} (max {} iterations)",
        config.agent_mode_label(),
        config.agent.max_iterations
    );

    ollabot_gateway::start(config).await?;

    Ok(())
}
