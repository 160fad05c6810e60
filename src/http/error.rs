//! Connection-level failures.

use std::time::Duration;

/// The inbound byte stream could not be framed into a request.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] httparse::Error),

    #[error("message head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("declared body of {length} bytes exceeds limit of {limit}")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("invalid content-length header")]
    InvalidContentLength,

    #[error("transfer-encoding is not supported for request bodies")]
    UnsupportedTransferEncoding,
}

/// A failure that ends a single connection. Never escapes the connection task.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
}

impl TransportError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Io(_) => "io",
            TransportError::Decode(_) => "decode",
            TransportError::IdleTimeout(_) => "idle_timeout",
        }
    }
}
