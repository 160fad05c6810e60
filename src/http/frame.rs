//! Inbound frames produced by the framing stage.

use crate::model::{find_headers, Headers, Method, Request, UnsupportedMethod};

/// Protocol version of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

/// Request line plus headers, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub uri: String,
    pub version: Version,
    pub headers: Headers,
}

impl RequestHead {
    pub fn new(method: impl Into<String>, uri: impl Into<String>, version: Version) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            version,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the connection persists after this exchange.
    ///
    /// HTTP/1.1 persists unless `connection: close`; HTTP/1.0 only with
    /// `connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        if self.has_connection_token("close") {
            return false;
        }
        match self.version {
            Version::Http11 => true,
            Version::Http10 => self.has_connection_token("keep-alive"),
        }
    }

    /// Whether the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.version == Version::Http11
            && find_headers(&self.headers, http::header::EXPECT.as_str())
                .any(|value| value.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// Folds the head and `body` into the handler model.
    pub fn into_request(self, body: Vec<u8>) -> Result<Request, UnsupportedMethod> {
        let method: Method = self.method.parse()?;
        let request = self
            .headers
            .into_iter()
            .fold(Request::new(method, self.uri), |request, (name, value)| {
                request.header(name, value)
            });
        Ok(request.body(body))
    }

    fn has_connection_token(&self, token: &str) -> bool {
        find_headers(&self.headers, http::header::CONNECTION.as_str())
            .flat_map(|value| value.split(','))
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(token))
    }
}

/// A request whose body has been fully received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullRequest {
    pub head: RequestHead,
    pub body: Vec<u8>,
}

/// One unit of inbound traffic, as handed to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Head received, body still in flight.
    HeadersOnly(RequestHead),
    /// Head and complete body.
    Complete(FullRequest),
    /// A message the adapter does not dispatch; the label names what it was.
    Unrecognized(&'static str),
}
