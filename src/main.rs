//! Forwarding HTTP Reverse Proxy
//!
//! A body-rewriting forwarding proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │              FORWARDING PROXY                 │
//!                      │                                               │
//!  Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!  ────────────────────┼─▶│  http   │───▶│  proxy   │───▶│upstream │──┼──▶ Upstream
//!                      │  │ server  │    │  engine  │    │ client  │  │    Server
//!                      │  └─────────┘    └────┬─────┘    └─────────┘  │
//!                      │                      │                       │
//!                      │               before_forward                 │
//!                      │          (log, body re-serialize,            │
//!                      │          content-length correlation)         │
//!                      │                                               │
//!  Client Response     │  ┌──────────────────┐                        │
//!  ◀───────────────────┼──│  after_forward   │◀───────────────────────┼──── Response
//!                      │  │ (log "Received") │                        │
//!                      │  └──────────────────┘                        │
//!                      │                                               │
//!                      │  ┌─────────────────────────────────────────┐ │
//!                      │  │          Cross-Cutting Concerns          │ │
//!                      │  │  config resolver │ session │ observability│ │
//!                      │  └─────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forwarding_proxy::config::loader::load_config;
use forwarding_proxy::config::resolver::{resolve_transport, DependencyRegistry, OptionsSource};
use forwarding_proxy::config::{ProxyConfig, ProxyOptions};
use forwarding_proxy::http::HttpServer;
use forwarding_proxy::observability::{logging, metrics};
use forwarding_proxy::proxy::ForwardingEngine;

#[derive(Parser)]
#[command(name = "forwarding-proxy", version, about = "Body-rewriting forwarding HTTP proxy")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration (defaults when no file is given)
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);

    tracing::info!("forwarding-proxy v0.1.0 starting");

    // Resolve proxy options once; a failure here aborts startup
    let source = OptionsSource::Static(ProxyOptions {
        config: config.upstream.clone(),
    });
    let transport = resolve_transport(source, &DependencyRegistry::new()).await?;

    // Resolve the session contract handed to the wiring layer
    let session = config.session.clone().resolve(config.runtime_mode);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %transport.target,
        request_timeout_secs = transport.request_timeout_secs,
        session_secret_ephemeral = session.ephemeral_secret,
        "Configuration resolved"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Initialize metrics endpoint
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Create and run the forwarding engine behind the HTTP server
    let engine = ForwardingEngine::new(transport)?;
    let server = HttpServer::new(engine, &config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
