//! Response status: numeric code plus reason phrase.

use std::borrow::Cow;
use std::fmt;

/// Status line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: u16,
    description: Cow<'static, str>,
}

impl Status {
    pub const CONTINUE: Status = Status::from_static(100, "Continue");
    pub const OK: Status = Status::from_static(200, "OK");
    pub const CREATED: Status = Status::from_static(201, "Created");
    pub const NO_CONTENT: Status = Status::from_static(204, "No Content");
    pub const BAD_REQUEST: Status = Status::from_static(400, "Bad Request");
    pub const NOT_FOUND: Status = Status::from_static(404, "Not Found");
    pub const METHOD_NOT_ALLOWED: Status = Status::from_static(405, "Method Not Allowed");
    pub const INTERNAL_SERVER_ERROR: Status = Status::from_static(500, "Internal Server Error");

    const fn from_static(code: u16, description: &'static str) -> Self {
        Self {
            code,
            description: Cow::Borrowed(description),
        }
    }

    /// Status with an explicit description.
    pub fn new(code: u16, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Status with the canonical reason phrase for `code` (empty when unknown).
    pub fn from_code(code: u16) -> Self {
        let description = http::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("");
        Self::new(code, description)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// 1xx statuses never carry a payload.
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.description)
    }
}
