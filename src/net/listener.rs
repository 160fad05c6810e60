//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured host and port with the configured backlog
//! - Accept incoming TCP connections until the close signal fires
//! - Enforce max_connections limit via semaphore
//! - Graceful handling of accept errors

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::{watch, Semaphore};

use crate::config::ListenerConfig;

/// Pause after a failed accept, so errors such as EMFILE do not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to resolve or bind the address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
#[derive(Debug)]
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
    /// Set SO_KEEPALIVE on accepted sockets.
    tcp_keepalive: bool,
    /// Address actually bound; differs from config when port 0 was requested.
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind on the calling thread and register the socket with `runtime`'s reactor.
    ///
    /// Returns once the socket is listening; accepting happens on `runtime`.
    pub fn bind(config: &ListenerConfig, runtime: &Handle) -> Result<Self, ListenerError> {
        let address = format!("{}:{}", config.host, config.port);
        let bind_error = |source| ListenerError::Bind {
            address: address.clone(),
            source,
        };

        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(bind_error)?
            .next()
            .ok_or_else(|| {
                bind_error(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "host resolved to no addresses",
                ))
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        #[cfg(unix)]
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;

        let listener = {
            let _runtime = runtime.enter();
            socket.listen(config.backlog).map_err(bind_error)?
        };
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
            tcp_keepalive: config.tcp_keepalive,
            local_addr,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                ListenerError::Accept(std::io::Error::other("connection limit closed"))
            })?;

        // Then accept the connection
        let (stream, peer) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        if self.tcp_keepalive {
            if let Err(error) = socket2::SockRef::from(&stream).set_keepalive(true) {
                tracing::warn!(peer_addr = %peer, %error, "Failed to enable SO_KEEPALIVE");
            }
        }

        tracing::debug!(
            peer_addr = %peer,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok(Accepted {
            stream,
            peer,
            permit: ConnectionPermit { _permit: permit },
        })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A freshly accepted connection.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub permit: ConnectionPermit,
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// Accepts connections and passes each to `on_accept` until `close` flips to
/// `true` (or its sender goes away). The listening socket is closed on return.
pub async fn accept_until_closed<F>(listener: Listener, mut close: watch::Receiver<bool>, mut on_accept: F)
where
    F: FnMut(Accepted),
{
    loop {
        let accepted = tokio::select! {
            _ = close.wait_for(|closed| *closed) => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok(accepted) => on_accept(accepted),
            Err(error) => {
                tracing::warn!(%error, "Accept failed");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    let address = listener.local_addr();
    drop(listener);
    tracing::info!(%address, "Listener closed");
}
