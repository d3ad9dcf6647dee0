//! Drain coordination.
//!
//! `main` owns one `Shutdown` and triggers it on SIGINT/SIGTERM. The HTTP
//! server holds a receiver and, once it fires, stops accepting connections
//! while aggregations already fanned out run to completion.

use tokio::sync::broadcast;

/// Fires once to start draining the aggregator.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver for the server's graceful-shutdown future.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Start draining. Safe to call with no server listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `shutdown` fires or its sender is gone.
pub async fn wait(mut shutdown: broadcast::Receiver<()>) {
    // Lagged still means a shutdown was sent
    let _ = shutdown.recv().await;
}
