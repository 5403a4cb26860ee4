//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::{info, warn};

/// Resolve once SIGTERM or SIGINT arrives. If the handler cannot be
/// installed, fall back to tokio's Ctrl-C listener.
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to install signal handler: {}, listening for Ctrl-C only", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
    signals.handle().close();
}
