//! Reactor HTTP Server Library
//!
//! Serves one synchronous `Request -> Response` handler over HTTP/1.1 on two
//! pools of single-threaded event loops: acceptors own the listening socket,
//! I/O loops own connections and run the handler.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use error::ServerError;
pub use handler::{CatchAll, Filter, HttpHandler};
pub use lifecycle::Server;
pub use model::{Host, Method, Request, Response, Status};
