//! Immutable HTTP message model.
//!
//! # Data Flow
//! ```text
//! wire request (http::codec)
//!     → Request (method, uri, headers, body)
//!     → HttpHandler::handle
//!     → Response (status, headers, body)
//!     → wire response (http::encode)
//! ```
//!
//! # Design Decisions
//! - Values are immutable; builders consume `self` and return a new value
//! - Headers are an ordered list of pairs, duplicates preserved
//! - Header names compare case-insensitively on lookup, never on storage

pub mod host;
pub mod method;
pub mod request;
pub mod response;
pub mod status;

pub use host::{Host, InvalidHost};
pub use method::{Method, UnsupportedMethod};
pub use request::Request;
pub use response::Response;
pub use status::Status;

/// Ordered header list as carried by requests and responses.
pub type Headers = Vec<(String, String)>;

/// First value of the named header, matched case-insensitively.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// All values of the named header, in order.
pub(crate) fn find_headers<'a>(
    headers: &'a [(String, String)],
    name: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .iter()
        .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
