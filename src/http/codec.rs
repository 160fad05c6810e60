//! HTTP/1.1 request framing.
//!
//! Buffers inbound bytes and cuts them into [`InboundFrame`]s. A request whose
//! body is not yet complete yields `HeadersOnly` once, followed by `Complete`
//! when the declared `content-length` has arrived. Pipelined requests are
//! yielded in arrival order.

use crate::config::LimitsConfig;
use crate::http::error::DecodeError;
use crate::http::frame::{FullRequest, InboundFrame, RequestHead, Version};
use crate::model::Headers;

#[derive(Debug)]
enum State {
    /// Waiting for a request line and headers.
    Head,
    /// Head delivered, collecting `remaining` body bytes.
    Body { head: RequestHead, length: usize },
    /// Skipping the payload of an unrecognized message.
    Discard { remaining: usize },
}

/// Incremental request decoder for one connection.
#[derive(Debug)]
pub struct RequestDecoder {
    buf: Vec<u8>,
    state: State,
    limits: LimitsConfig,
}

impl RequestDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            buf: Vec::new(),
            state: State::Head,
            limits,
        }
    }

    /// Appends bytes read from the socket.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// True when no partial message is buffered.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && matches!(self.state, State::Head)
    }

    /// Yields the next frame, or `None` until more bytes arrive.
    pub fn next_frame(&mut self) -> Result<Option<InboundFrame>, DecodeError> {
        loop {
            match std::mem::replace(&mut self.state, State::Head) {
                State::Head => return self.decode_head(),
                State::Body { head, length } => {
                    if self.buf.len() < length {
                        self.state = State::Body { head, length };
                        return Ok(None);
                    }
                    let body = self.buf.drain(..length).collect();
                    return Ok(Some(InboundFrame::Complete(FullRequest { head, body })));
                }
                State::Discard { remaining } => {
                    let skipped = remaining.min(self.buf.len());
                    self.buf.drain(..skipped);
                    if skipped < remaining {
                        self.state = State::Discard {
                            remaining: remaining - skipped,
                        };
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn decode_head(&mut self) -> Result<Option<InboundFrame>, DecodeError> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.starts_with(b"HTTP/") {
            return self.decode_status_line();
        }

        let Some((consumed, head)) = parse_request_head(&self.buf, self.limits.max_headers)? else {
            return self.check_head_size();
        };
        self.check_complete_head(consumed)?;
        let length = content_length(&head.headers)?;
        if has_transfer_encoding(&head.headers) {
            return Err(DecodeError::UnsupportedTransferEncoding);
        }
        if length > self.limits.max_body_bytes {
            return Err(DecodeError::BodyTooLarge {
                length,
                limit: self.limits.max_body_bytes,
            });
        }

        self.buf.drain(..consumed);
        if self.buf.len() >= length {
            let body = self.buf.drain(..length).collect();
            return Ok(Some(InboundFrame::Complete(FullRequest { head, body })));
        }

        self.state = State::Body {
            head: head.clone(),
            length,
        };
        Ok(Some(InboundFrame::HeadersOnly(head)))
    }

    /// A peer sent a response-shaped message. Skip it whole.
    fn decode_status_line(&mut self) -> Result<Option<InboundFrame>, DecodeError> {
        let mut headers = vec![httparse::EMPTY_HEADER; self.limits.max_headers];
        let mut response = httparse::Response::new(&mut headers);
        let consumed = match response.parse(&self.buf)? {
            httparse::Status::Complete(consumed) => consumed,
            httparse::Status::Partial => return self.check_head_size(),
        };
        self.check_complete_head(consumed)?;
        let headers = owned_headers(response.headers);
        let length = content_length(&headers)?;

        self.buf.drain(..consumed);
        self.state = State::Discard { remaining: length };
        Ok(Some(InboundFrame::Unrecognized("response")))
    }

    fn check_complete_head(&self, consumed: usize) -> Result<(), DecodeError> {
        if consumed > self.limits.max_head_bytes {
            return Err(DecodeError::HeadTooLarge {
                limit: self.limits.max_head_bytes,
            });
        }
        Ok(())
    }

    fn check_head_size(&self) -> Result<Option<InboundFrame>, DecodeError> {
        if self.buf.len() > self.limits.max_head_bytes {
            return Err(DecodeError::HeadTooLarge {
                limit: self.limits.max_head_bytes,
            });
        }
        Ok(None)
    }
}

fn parse_request_head(
    buf: &[u8],
    max_headers: usize,
) -> Result<Option<(usize, RequestHead)>, DecodeError> {
    let mut headers = vec![httparse::EMPTY_HEADER; max_headers];
    let mut request = httparse::Request::new(&mut headers);
    let consumed = match request.parse(buf)? {
        httparse::Status::Complete(consumed) => consumed,
        httparse::Status::Partial => return Ok(None),
    };

    let version = match request.version {
        Some(0) => Version::Http10,
        _ => Version::Http11,
    };
    let head = RequestHead {
        method: request.method.unwrap_or_default().to_string(),
        uri: request.path.unwrap_or_default().to_string(),
        version,
        headers: owned_headers(request.headers),
    };
    Ok(Some((consumed, head)))
}

fn owned_headers(headers: &[httparse::Header<'_>]) -> Headers {
    headers
        .iter()
        .map(|header| {
            (
                header.name.to_string(),
                String::from_utf8_lossy(header.value).into_owned(),
            )
        })
        .collect()
}

/// Declared body length; repeated headers must agree.
fn content_length(headers: &Headers) -> Result<usize, DecodeError> {
    let mut length = None;
    for (_, value) in headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(http::header::CONTENT_LENGTH.as_str()))
    {
        let parsed: usize = value
            .trim()
            .parse()
            .map_err(|_| DecodeError::InvalidContentLength)?;
        match length {
            Some(previous) if previous != parsed => return Err(DecodeError::InvalidContentLength),
            _ => length = Some(parsed),
        }
    }
    Ok(length.unwrap_or(0))
}

fn has_transfer_encoding(headers: &Headers) -> bool {
    headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(http::header::TRANSFER_ENCODING.as_str()))
}
