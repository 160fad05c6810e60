//! Outbound response value.

use crate::model::{find_header, Headers, Status};

/// An immutable HTTP response produced by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(Status::OK)
    }

    /// Appends a header, keeping any existing value of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces every value of the named header with a single one.
    pub fn replace_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
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

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (Status, Headers, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_header_drops_all_previous_values() {
        let response = Response::ok()
            .header("Set-Cookie", "a=1")
            .header("set-cookie", "b=2")
            .replace_header("Set-Cookie", "c=3");

        assert_eq!(
            response.headers(),
            &[("Set-Cookie".to_string(), "c=3".to_string())]
        );
    }

    #[test]
    fn builders_do_not_touch_other_fields() {
        let response = Response::new(Status::CREATED).body("done");
        assert_eq!(response.status(), &Status::CREATED);
        assert_eq!(response.body_bytes(), b"done");
        assert!(response.headers().is_empty());
    }
}
