//! Learner gateway (v1)
//!
//! HTTP façade in front of the learner/badging processing subsystem.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ preflight ──▶ handler ──▶ normalize ──▶ validate ──▶ dispatch ──┐
//!                                                                                    │
//!                                                               Processing subsystem ◀┘
//!     Client Response                                                                │
//!     ◀────────────── translate ◀────────── reply | rejection | timeout ◀────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use learner_gateway::auth::StaticTokens;
use learner_gateway::config::{load_config, GatewayConfig};
use learner_gateway::dispatch::HttpSubsystem;
use learner_gateway::observability::{logging, metrics};
use learner_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "learner-gateway")]
#[command(about = "Learner and badging API gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("learner-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        subsystem_url = %config.subsystem.url,
        wait_secs = config.dispatch.wait_secs,
        request_secs = config.limits.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let subsystem = Arc::new(HttpSubsystem::new(&config.subsystem)?);
    let authenticator = Arc::new(StaticTokens::from_config(&config.auth));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, subsystem, authenticator);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
