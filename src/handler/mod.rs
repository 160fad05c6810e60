//! Handler boundary.
//!
//! # Data Flow
//! ```text
//! Request
//!     → Filter chain (catch_all.rs first)
//!     → HttpHandler::handle
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Handlers are synchronous; they run to completion on the I/O loop thread
//! - Filters wrap a handler and yield a new handler, so chains compose with `then`
//! - Handlers are shared across I/O loops, hence `Send + Sync`

pub mod catch_all;

use std::sync::Arc;

use crate::model::{Request, Response};

pub use catch_all::CatchAll;

/// A synchronous request/response function.
pub trait HttpHandler: Send + Sync {
    fn handle(&self, request: Request) -> Response;
}

impl<F> HttpHandler for F
where
    F: Fn(Request) -> Response + Send + Sync,
{
    fn handle(&self, request: Request) -> Response {
        self(request)
    }
}

/// Handler shared by every connection of a server.
pub type SharedHandler = Arc<dyn HttpHandler>;

/// Decorates a handler: may inspect or replace the request and the response.
pub trait Filter: Send + Sync {
    fn filter(&self, request: Request, next: &dyn HttpHandler) -> Response;

    /// Wraps `handler` with this filter.
    fn then<H>(self, handler: H) -> Filtered<Self, H>
    where
        Self: Sized,
        H: HttpHandler,
    {
        Filtered {
            filter: self,
            next: handler,
        }
    }
}

/// A handler behind a filter.
pub struct Filtered<F, H> {
    filter: F,
    next: H,
}

impl<F: Filter, H: HttpHandler> HttpHandler for Filtered<F, H> {
    fn handle(&self, request: Request) -> Response {
        self.filter.filter(request, &self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, Status};

    struct AddHeader(&'static str);

    impl Filter for AddHeader {
        fn filter(&self, request: Request, next: &dyn HttpHandler) -> Response {
            next.handle(request).header("x-filter", self.0)
        }
    }

    #[test]
    fn closures_are_handlers() {
        let handler = |request: Request| Response::ok().body(request.uri().to_string());
        let response = handler.handle(Request::new(Method::Get, "/echo"));
        assert_eq!(response.body_bytes(), b"/echo");
    }

    #[test]
    fn filters_apply_outermost_last() {
        let handler = AddHeader("outer")
            .then(AddHeader("inner").then(|_: Request| Response::new(Status::NO_CONTENT)));

        let response = handler.handle(Request::new(Method::Get, "/"));
        let tags: Vec<_> = response
            .headers()
            .iter()
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(tags, vec!["inner", "outer"]);
    }

    #[test]
    fn shared_handlers_delegate() {
        let shared: SharedHandler = Arc::new(|_: Request| Response::ok());
        assert_eq!(shared.handle(Request::new(Method::Head, "/")).status(), &Status::OK);
    }
}
