//! Converts handler panics into `500 Internal Server Error` responses.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::handler::{Filter, HttpHandler};
use crate::model::{Request, Response, Status};

/// Filter that contains panics raised by the wrapped handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAll;

impl Filter for CatchAll {
    fn filter(&self, request: Request, next: &dyn HttpHandler) -> Response {
        let method = request.method();
        let uri = request.uri().to_string();

        match panic::catch_unwind(AssertUnwindSafe(|| next.handle(request))) {
            Ok(response) => response,
            Err(payload) => {
                tracing::error!(
                    method = %method,
                    uri = %uri,
                    panic = %panic_message(payload.as_ref()),
                    "Handler panicked"
                );
                Response::new(Status::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
