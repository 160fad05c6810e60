//! Inbound request value.

use crate::model::{find_header, find_headers, Headers, Method};

/// An immutable HTTP request as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header, keeping any existing value of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Request target exactly as received (path plus query).
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(&self.uri, |(path, _)| path)
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        find_headers(&self.headers, name)
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_duplicate_headers_in_order() {
        let request = Request::new(Method::Get, "/a?b=c")
            .header("Accept", "text/plain")
            .header("X-Tag", "one")
            .header("x-tag", "two");

        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.header_value("ACCEPT"), Some("text/plain"));
        assert_eq!(
            request.header_values("X-TAG").collect::<Vec<_>>(),
            vec!["one", "two"]
        );
    }

    #[test]
    fn splits_path_and_query() {
        let request = Request::new(Method::Get, "/search?q=rust");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query(), Some("q=rust"));

        let bare = Request::new(Method::Get, "/plain");
        assert_eq!(bare.path(), "/plain");
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn body_defaults_to_empty() {
        let request = Request::new(Method::Post, "/");
        assert!(request.body_bytes().is_empty());
        assert_eq!(request.body("hi").body_string(), "hi");
    }
}
