//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Stop the server on the first one
//!
//! # Design Decisions
//! - Uses Tokio's signal handling on a dedicated thread, outside the event loops
//! - A second signal during the drain is not special-cased

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::runtime::Builder;

use crate::lifecycle::Server;

/// Stop `server` when SIGINT or SIGTERM arrives.
pub fn stop_on_signal(server: Arc<Server>) -> io::Result<JoinHandle<()>> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let signal = runtime.block_on(wait_for_signal());
            tracing::info!(signal, "Shutdown signal received");
            server.stop();
        })
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(error) => {
            tracing::warn!(%error, "Failed to register SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
