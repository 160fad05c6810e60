//! Per-connection protocol adapter.
//!
//! Turns inbound frames into handler calls and handler responses into
//! outbound writes. The adapter performs no I/O itself; the connection task
//! writes what it returns, in order.

use std::time::Instant;

use crate::handler::SharedHandler;
use crate::http::encode::{encode, WireResponse};
use crate::http::frame::{FullRequest, InboundFrame};
use crate::model::{Method, Response, Status};
use crate::observability::metrics;

/// One response to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub response: WireResponse,
    /// Close the connection once this response has been flushed.
    pub close_after: bool,
}

impl Outbound {
    fn interim() -> Self {
        Self {
            response: WireResponse::interim_continue(),
            close_after: false,
        }
    }

    /// Makes a final response the last one on its connection. Interim
    /// responses pass through unchanged.
    pub fn closing(self) -> Self {
        if self.response.status().is_informational() {
            return self;
        }
        Self {
            response: self
                .response
                .with_header(http::header::CONNECTION.as_str(), "close"),
            close_after: true,
        }
    }
}

/// Adapter bound to a single connection for its whole lifetime.
pub struct ProtocolAdapter {
    handler: SharedHandler,
    /// `100 Continue` already written for the request in flight.
    continue_sent: bool,
}

impl ProtocolAdapter {
    /// `handler` is expected to be wrapped in [`crate::handler::CatchAll`] already.
    pub fn new(handler: SharedHandler) -> Self {
        Self {
            handler,
            continue_sent: false,
        }
    }

    /// Reacts to one inbound frame. An empty result means nothing to write.
    pub fn on_frame(&mut self, frame: InboundFrame) -> Vec<Outbound> {
        match frame {
            InboundFrame::HeadersOnly(head) => {
                if head.expects_continue() && !self.continue_sent {
                    self.continue_sent = true;
                    vec![Outbound::interim()]
                } else {
                    Vec::new()
                }
            }
            InboundFrame::Complete(full) => self.dispatch(full),
            InboundFrame::Unrecognized(kind) => {
                tracing::debug!(kind, "Ignoring unrecognized inbound message");
                Vec::new()
            }
        }
    }

    fn dispatch(&mut self, full: FullRequest) -> Vec<Outbound> {
        let mut writes = Vec::with_capacity(2);
        if full.head.expects_continue() && !self.continue_sent {
            writes.push(Outbound::interim());
        }
        self.continue_sent = false;

        let keep_alive = full.head.is_keep_alive();
        let started = Instant::now();
        let method_name = full.head.method.clone();

        let (is_head, response) = match full.head.into_request(full.body) {
            Ok(request) => (request.method() == Method::Head, self.handler.handle(request)),
            Err(unsupported) => {
                tracing::warn!(method = %unsupported.0, "Rejecting unsupported method");
                (false, method_not_allowed())
            }
        };

        metrics::record_request(&method_name, response.status().code(), started);
        tracing::debug!(
            method = %method_name,
            status = response.status().code(),
            keep_alive,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Request handled"
        );

        let suppress_body = is_head || response.status().is_informational();
        let mut wire = encode(response);
        if suppress_body {
            wire = wire.without_body();
        }
        let connection = if keep_alive { "keep-alive" } else { "close" };
        wire = wire.with_header(http::header::CONNECTION.as_str(), connection);

        writes.push(Outbound {
            response: wire,
            close_after: !keep_alive,
        });
        writes
    }
}

/// Response for methods outside [`Method::ALL`].
pub fn method_not_allowed() -> Response {
    let allow = Method::ALL
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Response::new(Status::METHOD_NOT_ALLOWED).header(http::header::ALLOW.as_str(), allow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CatchAll, Filter};
    use crate::http::frame::{RequestHead, Version};
    use crate::model::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn adapter(handler: impl Fn(Request) -> Response + Send + Sync + 'static) -> ProtocolAdapter {
        ProtocolAdapter::new(Arc::new(handler))
    }

    fn complete(head: RequestHead, body: &[u8]) -> InboundFrame {
        InboundFrame::Complete(FullRequest {
            head,
            body: body.to_vec(),
        })
    }

    #[test]
    fn keep_alive_get_scenario() {
        let mut adapter = adapter(|_| Response::ok().body("hi"));
        let head = RequestHead::new("GET", "/hello", Version::Http11).header("Connection", "keep-alive");

        let writes = adapter.on_frame(complete(head, b""));

        assert_eq!(writes.len(), 1);
        let out = &writes[0];
        assert!(!out.close_after);
        assert_eq!(out.response.status().code(), 200);
        assert_eq!(out.response.header_value("content-length"), Some("2"));
        assert_eq!(out.response.header_value("connection"), Some("keep-alive"));
        assert_eq!(out.response.payload(), b"hi");
    }

    #[test]
    fn non_persistent_request_closes_after_write() {
        let mut adapter = adapter(|_| Response::ok());
        let head = RequestHead::new("GET", "/", Version::Http11).header("Connection", "close");

        let writes = adapter.on_frame(complete(head, b""));

        assert!(writes[0].close_after);
        assert_eq!(writes[0].response.header_value("connection"), Some("close"));

        let legacy = adapter.on_frame(complete(RequestHead::new("GET", "/", Version::Http10), b""));
        assert!(legacy[0].close_after);
    }

    #[test]
    fn persistence_ignores_response_headers() {
        let mut adapter = adapter(|_| Response::ok().header("Connection", "close"));
        let writes = adapter.on_frame(complete(RequestHead::new("GET", "/", Version::Http11), b""));

        assert!(!writes[0].close_after);
        assert_eq!(writes[0].response.header_value("connection"), Some("keep-alive"));
    }

    #[test]
    fn continue_handshake_precedes_final_response() {
        let mut adapter = adapter(|request| {
            assert_eq!(request.body_bytes(), b"data");
            Response::new(Status::CREATED)
        });
        let head = RequestHead::new("POST", "/submit", Version::Http11)
            .header("Expect", "100-continue")
            .header("Content-Length", "4");

        let interim = adapter.on_frame(InboundFrame::HeadersOnly(head.clone()));
        assert_eq!(interim, vec![Outbound::interim()]);

        let writes = adapter.on_frame(complete(head, b"data"));
        assert_eq!(writes.len(), 1, "interim must not be repeated");
        assert_eq!(writes[0].response.status(), &Status::CREATED);
        assert_eq!(writes[0].response.header_value("content-length"), Some("0"));
    }

    #[test]
    fn continue_is_written_when_body_arrived_with_head() {
        let mut adapter = adapter(|_| Response::new(Status::CREATED));
        let head = RequestHead::new("POST", "/", Version::Http11).header("Expect", "100-continue");

        let writes = adapter.on_frame(complete(head.clone(), b"x"));
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], Outbound::interim());
        assert_eq!(writes[1].response.status().code(), 201);

        // The flag resets per exchange.
        assert_eq!(adapter.on_frame(complete(head, b"y")).len(), 2);
    }

    #[test]
    fn headers_only_without_expectation_is_silent() {
        let mut adapter = adapter(|_| panic!("must not dispatch on a partial request"));
        let head = RequestHead::new("POST", "/", Version::Http11).header("Content-Length", "10");
        assert!(adapter.on_frame(InboundFrame::HeadersOnly(head)).is_empty());
    }

    #[test]
    fn unrecognized_frames_are_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut adapter = adapter(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Response::ok()
        });

        assert!(adapter.on_frame(InboundFrame::Unrecognized("response")).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn request_reaches_handler_intact() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let mut adapter = adapter(move |request| {
            *sink.lock().unwrap() = Some(request);
            Response::ok()
        });
        let head = RequestHead::new("PATCH", "/items/7?dry=1", Version::Http11)
            .header("X-One", "a")
            .header("X-Two", "b")
            .header("x-one", "c");

        adapter.on_frame(complete(head, b"\x00\xffbytes"));

        let expected = Request::new(Method::Patch, "/items/7?dry=1")
            .header("X-One", "a")
            .header("X-Two", "b")
            .header("x-one", "c")
            .body(b"\x00\xffbytes".to_vec());
        assert_eq!(seen.lock().unwrap().take(), Some(expected));
    }

    #[test]
    fn unsupported_method_gets_405() {
        let mut adapter = adapter(|_| panic!("handler must not run"));
        let writes = adapter.on_frame(complete(RequestHead::new("BREW", "/", Version::Http11), b""));

        let response = &writes[0].response;
        assert_eq!(response.status(), &Status::METHOD_NOT_ALLOWED);
        assert!(response.header_value("allow").unwrap().starts_with("GET, POST"));
        assert!(!writes[0].close_after);
    }

    #[test]
    fn head_requests_get_length_but_no_payload() {
        let mut adapter = adapter(|_| Response::ok().body("12345"));
        let writes = adapter.on_frame(complete(RequestHead::new("HEAD", "/", Version::Http11), b""));

        assert_eq!(writes[0].response.header_value("content-length"), Some("5"));
        assert!(writes[0].response.payload().is_empty());
    }

    #[test]
    fn caught_panics_become_server_errors() {
        let safe = CatchAll.then(|_: Request| -> Response { panic!("handler bug") });
        let mut adapter = ProtocolAdapter::new(Arc::new(safe));

        let writes = adapter.on_frame(complete(RequestHead::new("GET", "/", Version::Http11), b""));
        assert_eq!(writes[0].response.status(), &Status::INTERNAL_SERVER_ERROR);
        assert!(!writes[0].close_after);
    }

    #[test]
    fn closing_rewrites_final_responses_only() {
        let mut adapter = adapter(|_| Response::ok());
        let head = RequestHead::new("POST", "/", Version::Http11).header("Expect", "100-continue");
        let writes: Vec<Outbound> = adapter
            .on_frame(complete(head, b""))
            .into_iter()
            .map(Outbound::closing)
            .collect();

        assert_eq!(writes[0].response.status(), &Status::CONTINUE);
        assert!(!writes[0].close_after);
        assert_eq!(writes[1].response.header_value("connection"), Some("close"));
        assert!(writes[1].close_after);
    }
}
