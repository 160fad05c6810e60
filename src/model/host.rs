//! Validated host name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The host string was empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not construct host from '{0}'")]
pub struct InvalidHost(pub String);

/// A non-empty host name or address literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidHost> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(InvalidHost(value));
        }
        Ok(Self(value))
    }

    pub fn localhost() -> Self {
        Self("localhost".to_string())
    }

    /// Wildcard IPv4 address, binds every interface.
    pub fn any() -> Self {
        Self("0.0.0.0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Host {
    type Error = InvalidHost;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Host::new(value)
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
