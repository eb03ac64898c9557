use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Verb;

/// Error document returned by the controller with non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApsErrorBody {
    /// HTTP-like code repeated in the body.
    #[serde(default)]
    pub code: Option<i64>,
    /// Exception class reported by the controller.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Human-readable reason.
    #[serde(default)]
    pub message: String,
}

/// REST call failures.
#[derive(Debug, Error)]
pub enum RestError {
    /// The controller answered with a non-success status.
    #[error("{verb} {path} returned HTTP {status}{}", describe(aps.as_deref()))]
    Status {
        /// Request verb.
        verb: Verb,
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Parsed APS error body, when the response carried one.
        aps: Option<Box<ApsErrorBody>>,
    },

    /// The request could not be delivered or the response not read.
    #[error("REST transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not JSON.
    #[error("failed to decode REST response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The request URL could not be built.
    #[error("invalid REST URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
        /// Parser message.
        message: String,
    },
}

/// APS message signalling an expired token.
const TOKEN_EXPIRED: &str = "Token expired";

impl RestError {
    /// Returns `true` for a 403 whose APS message reports an expired token.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            Self::Status { status: 403, aps: Some(body), .. } if body.message == TOKEN_EXPIRED
        )
    }

    /// HTTP status, for [`RestError::Status`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe(aps: Option<&ApsErrorBody>) -> String {
    aps.filter(|body| !body.message.is_empty())
        .map(|body| format!(": {}", body.message))
        .unwrap_or_default()
}
