//! Request methods understood by the handler model.

use std::fmt;
use std::str::FromStr;

/// The wire method name did not match any [`Method`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method: {0}")]
pub struct UnsupportedMethod(pub String);

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Patch,
    Purge,
    Head,
}

impl Method {
    /// Every supported method, in the order advertised by `allow` headers.
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Options,
        Method::Trace,
        Method::Patch,
        Method::Purge,
        Method::Head,
    ];

    /// Canonical upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Purge => "PURGE",
            Method::Head => "HEAD",
        }
    }
}

impl FromStr for Method {
    type Err = UnsupportedMethod;

    /// Method tokens are case-sensitive on the wire, so `get` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_canonical_name() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn rejects_unknown_and_lowercase_names() {
        assert_eq!(
            "CONNECT".parse::<Method>(),
            Err(UnsupportedMethod("CONNECT".into()))
        );
        assert!("get".parse::<Method>().is_err());
    }
}
