use std::fmt;

/// State of an asynchronous platform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Code `0`.
    Succeeded,
    /// Code `2`.
    Failed,
    /// Any other code; the request is still in flight.
    Running(i64),
}

impl RequestStatus {
    /// Classifies a `request_status` code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Succeeded,
            2 => Self::Failed,
            other => Self::Running(other),
        }
    }

    /// The platform's status code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Succeeded => 0,
            Self::Failed => 2,
            Self::Running(code) => code,
        }
    }

    /// Returns `true` once the request has succeeded or failed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running(_))
    }
}

/// Identifier of an asynchronous request opened with `pem.beginRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(i64);

impl RequestHandle {
    /// Wraps a request identifier.
    #[must_use]
    pub const fn new(request_id: i64) -> Self {
        Self(request_id)
    }

    /// The request identifier.
    #[must_use]
    pub const fn id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
