//! Response encoding.

use crate::model::{find_header, Headers, Response, Status};

/// A response ready to be serialized onto the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    status: Status,
    headers: Headers,
    body: Vec<u8>,
    omit_body: bool,
}

/// Translates a handler response into its wire form.
///
/// `content-length` always reflects the body; caller supplied
/// `content-length` and `transfer-encoding` values are dropped.
pub fn encode(response: Response) -> WireResponse {
    let (status, headers, body) = response.into_parts();
    let mut headers: Headers = headers
        .into_iter()
        .filter(|(name, _)| !is_framing_header(name))
        .collect();
    headers.push((
        http::header::CONTENT_LENGTH.as_str().to_string(),
        body.len().to_string(),
    ));

    WireResponse {
        status,
        headers,
        body,
        omit_body: false,
    }
}

fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(http::header::CONTENT_LENGTH.as_str())
        || name.eq_ignore_ascii_case(http::header::TRANSFER_ENCODING.as_str())
}

impl WireResponse {
    /// The interim `100 Continue` response.
    pub fn interim_continue() -> Self {
        Self {
            status: Status::CONTINUE,
            headers: Vec::new(),
            body: Vec::new(),
            omit_body: true,
        }
    }

    /// Sets a header, replacing every existing value of that name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Keeps the headers (including `content-length`) but sends no payload.
    pub fn without_body(mut self) -> Self {
        self.omit_body = true;
        self
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Payload bytes that will be written.
    pub fn payload(&self) -> &[u8] {
        if self.omit_body {
            &[]
        } else {
            &self.body
        }
    }

    /// Appends the HTTP/1.1 serialization to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"HTTP/1.1 ");
        out.extend_from_slice(self.status.code().to_string().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.status.description().as_bytes());
        out.extend_from_slice(b"\r\n");
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(self.payload());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.body.len());
        self.write_to(&mut out);
        out
    }
}
