//! Request aggregator.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │               REQUEST AGGREGATOR             │
//!                          │                                              │
//!     GET /                │  ┌─────────┐    ┌───────────┐                │
//!     ─────────────────────┼─▶│  http   │───▶│  fanout   │──┬─ guard ─────┼──▶ upstream 0
//!                          │  │ server  │    │ collector │  ├─ guard ─────┼──▶ upstream 1
//!                          │  └─────────┘    └───────────┘  └─ guard ─────┼──▶ upstream N
//!     JSON array           │       ▲               │                      │
//!     ◀────────────────────┼───────┴── response ◀──┘ (index-aligned)      │
//!                          │                                              │
//!                          │   config · observability · lifecycle         │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_aggregator::config::load_config;
use request_aggregator::http::HttpServer;
use request_aggregator::lifecycle::{signals, Shutdown};
use request_aggregator::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-aggregator")]
#[command(about = "Fans each request out to every configured upstream", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "aggregator.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    logging::init(&config.observability.log_level);

    tracing::info!("request-aggregator v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %args.config.display(),
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        deadline_ms = config.timeouts.deadline_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
