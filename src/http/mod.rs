//! HTTP/1.1 protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! accepted TCP connection
//!     → connection.rs (read batches, write, flush, close)
//!     → codec.rs (bytes → InboundFrame: HeadersOnly / Complete / Unrecognized)
//!     → adapter.rs (100-continue, Request, handler call, keep-alive decision)
//!     → encode.rs (Response → WireResponse, content-length from body)
//!     → back to connection.rs for writing
//! ```
//!
//! # Design Decisions
//! - The adapter is pure with respect to I/O; it returns what to write
//! - Handlers run synchronously on the connection's event loop thread
//! - Any transport failure closes the connection without a response

pub mod adapter;
pub mod codec;
pub mod connection;
pub mod encode;
pub mod error;
pub mod frame;

pub use adapter::{Outbound, ProtocolAdapter};
pub use codec::RequestDecoder;
pub use connection::{serve, ConnectionSettings};
pub use encode::{encode, WireResponse};
pub use error::{DecodeError, TransportError};
pub use frame::{FullRequest, InboundFrame, RequestHead, Version};
