//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server.rs):
//!     Acceptor pool → I/O pool → Bind listener → Accept task on an acceptor loop
//!
//! Shutdown (server.rs, shutdown.rs):
//!     stop() → Close listener → Drain I/O loops → Stop acceptor loops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - Ordered startup: event loops first, listener last (traffic only when ready)
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: connections still open after the drain are dropped

pub mod event_loop;
pub mod server;
pub mod shutdown;
pub mod signals;

pub use event_loop::{EventLoop, EventLoopGroup, LoopHandle, LoopSelector};
pub use server::Server;
pub use shutdown::CloseSignal;
pub use signals::stop_on_signal;
