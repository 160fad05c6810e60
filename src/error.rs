//! Server lifecycle errors.

use crate::config::ConfigError;
use crate::net::ListenerError;

/// Why `Server::start` failed.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configuration violates a validation rule. Nothing was started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listening socket could not be set up. Both pools have been shut down.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// An event loop thread or runtime could not be created.
    #[error("Failed to start {pool} event loops: {source}")]
    EventLoop {
        pool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Server is already started")]
    AlreadyStarted,

    #[error("Server was stopped and cannot be started again")]
    Stopped,
}
