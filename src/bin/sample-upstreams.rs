//! Demo upstreams: each port answers `GET /` with a random number.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};
use clap::Parser;
use rand::Rng;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "sample-upstreams")]
#[command(about = "Serve demo upstreams for the request aggregator", long_about = None)]
struct Args {
    /// Ports to listen on.
    #[arg(short, long, value_delimiter = ',', default_value = "3001,3002,3003")]
    ports: Vec<u16>,

    /// Delay before answering, to simulate a slow upstream.
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let delay = Duration::from_millis(args.delay_ms);

    let mut servers = JoinSet::new();
    for port in args.ports {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = Router::new().route("/", get(move || random_number(delay)));

        tracing::info!(address = %addr, "Sample upstream listening");
        servers.spawn(async move { axum::serve(listener, app).await });
    }

    while let Some(joined) = servers.join_next().await {
        joined??;
    }
    Ok(())
}

async fn random_number(delay: Duration) -> String {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    rand::thread_rng().gen_range(0..100).to_string()
}
