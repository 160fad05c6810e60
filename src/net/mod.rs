//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop on an acceptor loop, connection limits)
//!     → connection.rs (identity, per-loop tracking)
//!     → Hand off to an I/O loop and the HTTP layer
//!
//! Connection States:
//!     Accepted → Registered → Active → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{accept_until_closed, Accepted, ConnectionPermit, Listener, ListenerError};
