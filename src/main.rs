//! Reactor HTTP Server (v1)
//!
//! Serves a demo echo handler on the reactor server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────────┐
//!                        │                   REACTOR SERVER                    │
//!                        │                                                    │
//!   Client connection    │  ┌──────────────┐  hand-off   ┌────────────────┐   │
//!   ─────────────────────┼─▶│ acceptor loop│────────────▶│   I/O loop n   │   │
//!                        │  │  (listener)  │ round-robin │ codec/adapter  │   │
//!                        │  └──────────────┘             └───────┬────────┘   │
//!                        │                                       │            │
//!                        │                                       ▼            │
//!   Client response      │                               ┌────────────────┐   │
//!   ◀────────────────────┼───────────────────────────────│ CatchAll →     │   │
//!                        │                               │ HttpHandler    │   │
//!                        │                               └────────────────┘   │
//!                        │                                                    │
//!                        │  config · lifecycle (start/block/stop) · signals   │
//!                        │  observability (tracing, Prometheus metrics)       │
//!                        └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use reactor_http::config::{load_config, LogFormat, ServerConfig};
use reactor_http::lifecycle::stop_on_signal;
use reactor_http::observability::{logging, metrics};
use reactor_http::{Request, Response};

#[derive(Parser)]
#[command(name = "reactor-http")]
#[command(about = "HTTP/1.1 server on single-threaded event loops", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override observability.log_format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(format) = cli.log_format {
        config.observability.log_format = format;
    }

    logging::init(&config.observability)?;
    tracing::info!("reactor-http v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        acceptor_threads = config.event_loops.acceptor_threads,
        io_threads = config.event_loops.io_threads,
        idle_secs = config.timeouts.idle_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(error) = metrics::init_metrics(addr) {
                    tracing::error!(%error, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = Arc::new(config.to_server(echo));
    server.start()?;
    stop_on_signal(Arc::clone(&server))?;

    server.block();
    // Waits for a stop already in progress on the signal thread.
    server.stop();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Echoes the request body, or the request line when there is none.
fn echo(request: Request) -> Response {
    let body = if request.body_bytes().is_empty() {
        format!("{} {}\n", request.method(), request.uri()).into_bytes()
    } else {
        request.body_bytes().to_vec()
    };
    Response::ok()
        .header("content-type", "text/plain; charset=utf-8")
        .body(body)
}
