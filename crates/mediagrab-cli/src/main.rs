//! mediagrab command-line entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mediagrab_axum::{CorsConfig, ServerConfig, start_server};

#[derive(Parser)]
#[command(name = "mediagrab", version, about = "Media download service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Base directory for downloads, cookies, and bundled tools.
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        /// Allowed CORS origins; all origins when omitted.
        #[arg(long)]
        allow_origin: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            port,
            base_dir,
            allow_origin,
        } => {
            let cors = if allow_origin.is_empty() {
                CorsConfig::AllowAll
            } else {
                CorsConfig::AllowOrigins(allow_origin)
            };
            let config = ServerConfig {
                port,
                base_dir,
                cors,
            };
            tracing::info!(port = config.port, "Starting mediagrab server");
            start_server(config).await
        }
    }
}
