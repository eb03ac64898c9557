use thiserror::Error;

/// Failures below the platform's result envelope.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The server answered with an XML-RPC `<fault>`.
    #[error("XML-RPC fault {code}: {message}")]
    Fault {
        /// `faultCode` member.
        code: i64,
        /// `faultString` member.
        message: String,
    },

    /// The request could not be delivered or the response not read.
    #[error("XML-RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    #[error("XML-RPC endpoint returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response body is not a well-formed XML-RPC document.
    #[error("malformed XML-RPC response: {message}")]
    Codec {
        /// Description of the defect.
        message: String,
    },
}

impl RpcError {
    pub(crate) fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }
}
