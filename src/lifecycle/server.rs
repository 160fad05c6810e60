//! Server state machine: start, block, stop.
//!
//! ```text
//! Created ──start──▶ Started ──stop──▶ Stopped
//!    └──────────────stop──────────────────▲
//! ```
//!
//! Start brings up the acceptor and I/O pools, then binds. Stop closes the
//! listener, drains the I/O pool, then the acceptor pool.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::net::TcpStream;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::error::ServerError;
use crate::handler::{CatchAll, Filter, HttpHandler, SharedHandler};
use crate::http::{serve, ConnectionSettings, ProtocolAdapter};
use crate::lifecycle::event_loop::{EventLoopGroup, LoopHandle};
use crate::lifecycle::shutdown::CloseSignal;
use crate::net::{accept_until_closed, Accepted, Listener};
use crate::observability::metrics;

/// An HTTP/1.1 server for one synchronous handler.
///
/// Every request passes through [`CatchAll`] before reaching the handler, so
/// a panicking handler answers 500 instead of tearing down its connection.
pub struct Server {
    config: ServerConfig,
    handler: SharedHandler,
    state: Mutex<State>,
    close: Arc<CloseSignal>,
}

enum State {
    Created,
    Started(Running),
    Stopped,
}

struct Running {
    acceptors: EventLoopGroup,
    workers: EventLoopGroup,
    local_addr: SocketAddr,
    /// Fires once the accept task has dropped the listening socket.
    listener_closed: mpsc::Receiver<()>,
}

impl Server {
    pub fn new<H: HttpHandler + 'static>(config: ServerConfig, handler: H) -> Self {
        Self {
            config,
            handler: Arc::new(CatchAll.then(handler)),
            state: Mutex::new(State::Created),
            close: Arc::new(CloseSignal::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the event loops and begin accepting.
    ///
    /// Returns once the socket is bound and listening. The configuration is
    /// validated first, whether or not it came from a file. On failure every
    /// thread started so far has been shut down.
    pub fn start(&self) -> Result<&Self, ServerError> {
        let mut state = self.lock_state();
        match *state {
            State::Created => {}
            State::Started(_) => return Err(ServerError::AlreadyStarted),
            State::Stopped => return Err(ServerError::Stopped),
        }
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let loops = &self.config.event_loops;
        let drain = self.config.timeouts.drain();
        let mut acceptors = EventLoopGroup::new("acceptor", loops.acceptor_threads, drain)
            .map_err(|source| ServerError::EventLoop {
                pool: "acceptor",
                source,
            })?;
        let mut workers = match EventLoopGroup::new("io", loops.io_threads, drain) {
            Ok(workers) => workers,
            Err(source) => {
                acceptors.shutdown_gracefully();
                return Err(ServerError::EventLoop { pool: "io", source });
            }
        };

        let acceptor = acceptors.next().clone();
        let listener = match Listener::bind(&self.config.listener, acceptor.runtime()) {
            Ok(listener) => listener,
            Err(error) => {
                tracing::error!(%error, "Bind failed, shutting down event loops");
                workers.shutdown_gracefully();
                acceptors.shutdown_gracefully();
                return Err(error.into());
            }
        };

        let local_addr = listener.local_addr();
        let (closed_tx, listener_closed) = mpsc::channel();
        let selector = workers.selector();
        let handler = Arc::clone(&self.handler);
        let settings = ConnectionSettings {
            limits: self.config.limits,
            idle_timeout: self.config.timeouts.idle(),
        };
        let close_rx = self.close.subscribe();
        let close = Arc::clone(&self.close);
        acceptor.runtime().spawn(async move {
            accept_until_closed(listener, close_rx, |accepted| {
                hand_off(selector.next(), accepted, Arc::clone(&handler), settings);
            })
            .await;
            let _ = closed_tx.send(());
            // Wakes `block` callers if the loop ended on its own.
            close.fire();
        });

        tracing::info!(
            address = %local_addr,
            acceptor_threads = acceptors.len(),
            io_threads = workers.len(),
            "Server started"
        );

        *state = State::Started(Running {
            acceptors,
            workers,
            local_addr,
            listener_closed,
        });
        Ok(self)
    }

    /// Block the calling thread until the server stops. Returns immediately
    /// if it was never started.
    pub fn block(&self) -> &Self {
        let started = matches!(*self.lock_state(), State::Started(_));
        if started {
            self.close.wait();
        }
        self
    }

    /// Stop accepting, drain connections, and release all threads.
    ///
    /// Idempotent and safe before `start`. A concurrent caller returns once
    /// the first stop has finished.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        let previous = std::mem::replace(&mut *state, State::Stopped);
        self.close.fire();

        let State::Started(mut running) = previous else {
            return;
        };

        tracing::info!(
            address = %running.local_addr,
            connections = running.workers.active_connections(),
            "Stopping server"
        );
        if running
            .listener_closed
            .recv_timeout(self.config.timeouts.drain())
            .is_err()
        {
            tracing::warn!("Listener did not close within the drain timeout");
        }
        running.workers.shutdown_gracefully();
        running.acceptors.shutdown_gracefully();
        tracing::info!("Server stopped");
    }

    /// The bound address while started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lock_state() {
            State::Started(running) => Some(running.local_addr),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), State::Started(_))
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

/// Move an accepted socket onto `target` and serve it there.
///
/// The connection is tracked before the task is spawned, so a concurrent
/// drain never misses it.
fn hand_off(target: &LoopHandle, accepted: Accepted, handler: SharedHandler, settings: ConnectionSettings) {
    let Accepted {
        stream,
        peer,
        permit,
    } = accepted;
    let stream = match stream.into_std() {
        Ok(stream) => stream,
        Err(error) => {
            tracing::warn!(peer_addr = %peer, %error, "Failed to detach accepted socket");
            return;
        }
    };

    let guard = target.tracker().track();
    let shutdown = target.shutdown_signal();
    let event_loop = target.name().to_string();
    target.runtime().spawn(async move {
        let _permit = permit;
        let connection_id = guard.id();
        let stream = match TcpStream::from_std(stream) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%connection_id, peer_addr = %peer, %error, "Failed to register socket");
                return;
            }
        };
        tracing::debug!(%connection_id, peer_addr = %peer, %event_loop, "Connection registered");

        match serve(stream, ProtocolAdapter::new(handler), settings, shutdown).await {
            Ok(()) => tracing::trace!(%connection_id, "Connection finished"),
            Err(error) => {
                metrics::record_transport_failure(error.kind());
                tracing::debug!(%connection_id, peer_addr = %peer, %error, "Connection closed after transport failure");
            }
        }
        drop(guard);
    });
}
