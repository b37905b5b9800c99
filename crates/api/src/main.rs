//! Switchboard API server binary.
//!
//! Usage:
//!   switchboard-api --config switchboard.toml
//!   switchboard-api --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `SWITCHBOARD_API_KEY` - API authentication key (recommended)
//! - `SWITCHBOARD_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `SWITCHBOARD_CORS_ORIGINS` - CORS allowed origins (comma-separated)
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` - reasoning service key
//! - `SN_INSTANCE`, `SN_USER`, `SN_PASS` - ServiceNow credentials

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use switchboard_api::{serve, ApiKeyConfig, AppState};
use switchboard_coordinator::SwitchboardConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "switchboard-api", version, about = "Switchboard HTTP API server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Bind address
    #[arg(short, long, env = "SWITCHBOARD_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,switchboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.bind == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0, which exposes the API on all interfaces. \
             Set SWITCHBOARD_API_KEY and keep a firewall in place."
        );
    }

    let api_key = std::env::var("SWITCHBOARD_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!(
            "SWITCHBOARD_API_KEY not set; the API will run without authentication. \
             Fine for local development, not for production."
        );
    }

    let cors_origins: Option<Vec<String>> = std::env::var("SWITCHBOARD_CORS_ORIGINS")
        .ok()
        .map(|s| s.split(',').map(|o| o.trim().to_string()).collect());

    if let Some(ref path) = args.config {
        tracing::info!(path = %path.display(), "Loading configuration");
    } else {
        tracing::info!("Using default configuration");
    }
    let config = SwitchboardConfig::load(args.config.as_deref())?;

    let mut state = AppState::from_config(&config)?;
    if let Some(key) = api_key {
        state = state.with_api_key(ApiKeyConfig::new(key));
        tracing::info!("API key authentication enabled");
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    serve(Arc::new(state), addr, cors_origins).await?;

    Ok(())
}
