//! Latency-aware router
//!
//! Fronts named pools of identical backends and sends each request to the
//! member that answered its most recent health probe fastest.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 LATENCY ROUTER                   │
//!                     │                                                  │
//!   GET /<pool>       │  ┌──────────┐   ┌──────────────┐   ┌───────────┐ │
//!   ──────────────────┼─▶│  front   │──▶│ pool: latest │──▶│ forwarder │─┼──▶ Member
//!                     │  │  door    │   │    target    │   │           │ │
//!   JSON body         │  └──────────┘   └──────▲───────┘   └───────────┘ │
//!   ◀─────────────────┼────────────────────────┼─────────────────────────┤
//!                     │                        │ publish                 │
//!                     │               ┌────────┴───────┐                 │
//!                     │               │ pool selector  │ every interval  │
//!                     │               │  (per pool)    │─── probes ──────┼──▶ Members
//!                     │               └────────▲───────┘                 │
//!                     │                        │ members                 │
//!                     │               ┌────────┴───────┐                 │
//!                     │               │   inventory    │◀────────────────┼─── Inventory
//!                     │               │   resolver     │                 │
//!                     │               └────────────────┘                 │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use latency_router::config::load_config;
use latency_router::lifecycle::startup::bind;
use latency_router::lifecycle::{shutdown_signal, App, Shutdown};
use latency_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "latency-router")]
#[command(about = "Routes each pool's requests to its lowest-latency healthy member", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ROUTER_CONFIG")]
    config: PathBuf,

    /// Override `listener.port`
    #[arg(short = 'p', long)]
    listen_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.listen_port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "latency-router starting");
    tracing::info!(path = %cli.config.display(), pools = config.pools.len(), "Configuration loaded");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address();
    let app = App::bootstrap(config).await?;
    let listener = bind(&address).await?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    app.serve(listener, shutdown).await?;
    Ok(())
}
