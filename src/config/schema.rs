//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::handler::HttpHandler;
use crate::lifecycle::Server;
use crate::model::Host;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening socket settings.
    pub listener: ListenerConfig,

    /// Acceptor and I/O event loop pool sizes.
    pub event_loops: EventLoopConfig,

    /// Idle and drain timeouts.
    pub timeouts: TimeoutConfig,

    /// Request framing limits.
    pub limits: LimitsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Config for `port` with every other value defaulted.
    pub fn with_port(port: u16) -> Self {
        let mut config = Self::default();
        config.listener.port = port;
        config
    }

    /// Builds a server serving `handler` with this configuration.
    pub fn to_server<H: HttpHandler + 'static>(self, handler: H) -> Server {
        Server::new(self, handler)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host name or address literal to bind.
    pub host: Host,

    /// TCP port; 0 picks an ephemeral port.
    pub port: u16,

    /// Pending-connection queue length passed to `listen(2)`.
    pub backlog: u32,

    /// Enable SO_KEEPALIVE on accepted sockets.
    pub tcp_keepalive: bool,

    /// Maximum concurrent connections (backpressure on accept).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: Host::any(),
            port: 8000,
            backlog: 128,
            tcp_keepalive: true,
            max_connections: 10_000,
        }
    }
}

/// Event loop pool sizes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Loops that only accept connections.
    pub acceptor_threads: usize,

    /// Loops that own connections and run handlers.
    pub io_threads: usize,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            acceptor_threads: 1,
            io_threads: default_io_threads(),
        }
    }
}

fn default_io_threads() -> usize {
    std::thread::available_parallelism()
        .map(|threads| threads.get())
        .unwrap_or(2)
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Close connections idle this long, in seconds. 0 disables.
    pub idle_secs: u64,

    /// How long `stop` lets in-flight exchanges finish, in seconds.
    pub drain_secs: u64,
}

impl TimeoutConfig {
    pub fn idle(&self) -> Option<Duration> {
        (self.idle_secs > 0).then(|| Duration::from_secs(self.idle_secs))
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: 60,
            drain_secs: 5,
        }
    }
}

/// Request framing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request line plus headers, in bytes.
    pub max_head_bytes: usize,

    /// Largest number of request headers.
    pub max_headers: usize,

    /// Largest declared request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_head_bytes: 8 * 1024,
            max_headers: 64,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.port, 8000);
        assert_eq!(config.listener.host, Host::any());
        assert_eq!(config.listener.backlog, 128);
        assert_eq!(config.event_loops.acceptor_threads, 1);
        assert!(config.event_loops.io_threads >= 1);
        assert_eq!(config.timeouts.idle(), Some(Duration::from_secs(60)));
        assert_eq!(config.limits.max_headers, 64);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            host = "127.0.0.1"
            port = 9000

            [timeouts]
            idle_secs = 0

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.host.as_str(), "127.0.0.1");
        assert_eq!(config.listener.port, 9000);
        assert!(config.listener.tcp_keepalive);
        assert_eq!(config.timeouts.idle(), None);
        assert_eq!(config.timeouts.drain(), Duration::from_secs(5));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.limits, LimitsConfig::default());
    }

    #[test]
    fn empty_host_is_rejected_while_parsing() {
        let parsed: Result<ServerConfig, _> = toml::from_str("[listener]\nhost = \"\"\n");
        assert!(parsed.is_err());
    }
}
