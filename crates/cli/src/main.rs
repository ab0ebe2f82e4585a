//! ollabot CLI: the main entry point.
//!
//! Commands:
//! - `serve`  Start the HTTP API server
//! - `tools`  List the tools the agent can call
//! - `models` List the models available on the Ollama backend

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ollabot",
    about = "ollabot — tool-calling chat backend for a local Ollama runtime",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools available to the agent
    Tools,

    /// List models available on the Ollama backend
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Models => commands::models::run().await?,
    }

    Ok(())
}
