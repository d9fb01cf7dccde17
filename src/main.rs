//! askgate server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────────┐
//!                      │                      ASKGATE                        │
//!                      │                                                     │
//!   POST /api/ask      │  ┌────────┐   ┌─────────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│  http  │──▶│ AskService  │──▶│    cache     │   │
//!                      │  └────────┘   └──────┬──────┘   └──────────────┘   │
//!                      │                      │ miss                         │
//!                      │                      ▼                              │
//!                      │               ┌─────────────┐   ┌──────────────┐   │
//!                      │               │  ApiClient  │──▶│ rate limit,  │   │      Upstream
//!                      │               │  (retries)  │   │ proxy pool   │───┼────▶ API
//!                      │               └──────▲──────┘   └──────────────┘   │
//!                      │                      │                              │
//!                      │               ┌──────┴──────┐   ┌──────────────┐   │
//!                      │               │   health    │   │   session    │   │
//!                      │               │   monitor   │   │   (JSON)     │   │
//!                      │               └─────────────┘   └──────────────┘   │
//!                      └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use askgate::config::load_or_default;
use askgate::lifecycle::{spawn_signal_handler, Shutdown};
use askgate::observability::init_logging;
use askgate::{AskService, HttpServer};

#[derive(Parser)]
#[command(name = "askgate", version, about = "Resilient gateway to a rate-limited question-answering API")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "askgate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(&args.config)?;
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "askgate starting"
    );
    tracing::info!(
        bind_address = %config.server.bind_address,
        base_url = %config.api.base_url,
        proxies = config.proxy.proxies.len(),
        cache_enabled = config.cache.enabled,
        health_enabled = config.health.enabled,
        "Configuration loaded"
    );

    let service = Arc::new(AskService::new(&config)?);
    service.start_monitoring();

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config.server, service.clone());
    let result = server.run(listener, server_shutdown).await;

    service.shutdown().await;
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
