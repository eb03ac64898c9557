//! Errors surfaced by the dispatcher and the domain operations.
//!
//! Remote application failures collapse into [`RemoteCallError`], which keeps
//! the platform's `(module_id, extype_id)` pair so callers can recognise
//! specific conditions with [`ApiError::is_known`]. Transport failures pass
//! through unchanged in [`ApiError::Rpc`] and [`ApiError::Rest`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::license::LicenseError;
use crate::rest::RestError;
use crate::rpc::{MethodNameError, Params, RpcError, Value};
use crate::schema::SchemaError;

/// A `(module_id, extype_id)` pair with a known meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnownError {
    /// Platform module reporting the error.
    pub module: &'static str,
    /// Error type code within the module.
    pub code: i64,
}

impl KnownError {
    /// No license is installed or the installed one has expired.
    pub const LICENSE_NOT_ACTIVE: Self = Self {
        module: "Licensing",
        code: 1,
    };

    /// No host is registered under the requested address.
    pub const HOST_NOT_FOUND: Self = Self {
        module: "Hosts",
        code: 1,
    };

    /// Module id used for XML-RPC faults, which carry no platform module.
    pub const XMLRPC_MODULE: &'static str = "xmlrpc";
}

/// The platform executed a call and reported an application failure.
#[derive(Debug, Error)]
#[error("{method} failed{}: {message}", code_suffix(module_id.as_deref(), *extype_id))]
pub struct RemoteCallError {
    /// Fully qualified method name.
    pub method: String,
    /// Platform module that raised the error.
    pub module_id: Option<String>,
    /// Error type code within the module.
    pub extype_id: Option<i64>,
    /// Message reported by the platform.
    pub message: String,
    /// Lower-level error the failure was derived from.
    #[source]
    pub source: Option<Arc<RpcError>>,
}

impl RemoteCallError {
    /// Builds the error from a platform result envelope with a non-zero
    /// `status`.
    #[must_use]
    pub fn from_envelope(method: &str, envelope: &Value) -> Self {
        Self {
            method: method.to_owned(),
            module_id: envelope
                .get("module_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
            extype_id: envelope.get("extype_id").and_then(Value::as_i64),
            message: envelope
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified platform error")
                .to_owned(),
            source: None,
        }
    }

    /// Builds the error from an XML-RPC fault.
    #[must_use]
    pub fn from_fault(method: &str, code: i64, message: &str, fault: RpcError) -> Self {
        Self {
            method: method.to_owned(),
            module_id: Some(KnownError::XMLRPC_MODULE.to_owned()),
            extype_id: Some(code),
            message: message.to_owned(),
            source: Some(Arc::new(fault)),
        }
    }

    /// Returns `true` when the error carries `module`/`code`.
    #[must_use]
    pub fn is(&self, module: &str, code: i64) -> bool {
        self.module_id.as_deref() == Some(module) && self.extype_id == Some(code)
    }
}

fn code_suffix(module: Option<&str>, code: Option<i64>) -> String {
    match (module, code) {
        (Some(module_id), Some(extype_id)) => format!(" ({module_id}/{extype_id})"),
        (Some(module_id), None) => format!(" ({module_id})"),
        (None, Some(extype_id)) => format!(" (code {extype_id})"),
        (None, None) => String::new(),
    }
}

/// Errors raised by dispatcher calls and domain operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform reported an application failure.
    #[error(transparent)]
    RemoteCall(Box<RemoteCallError>),

    /// An asynchronous request reached the failed status.
    #[error("failure while executing {method} with args {args}, status: {status}")]
    AsyncFailed {
        /// Fully qualified method name.
        method: String,
        /// Arguments of the call, secrets masked on display.
        args: Params,
        /// Request identifier.
        request_id: i64,
        /// Last observed status code.
        status: i64,
    },

    /// An asynchronous request did not finish in time.
    #[error("timeout ({timeout:?}) while executing {method} with args {args}")]
    Timeout {
        /// Fully qualified method name.
        method: String,
        /// Arguments of the call, secrets masked on display.
        args: Params,
        /// The wait budget that was exceeded.
        timeout: Duration,
    },

    /// The call was invoked inside a transaction that could not be committed.
    #[error("request {request_id} for {method} started but commit failed: {source}")]
    CommitFailed {
        /// Fully qualified method name.
        method: String,
        /// Identifier returned by `pem.beginRequest`.
        request_id: i64,
        /// Why the commit failed.
        #[source]
        source: Box<ApiError>,
    },

    /// XML-RPC transport or codec failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// REST failure.
    #[error(transparent)]
    Rest(#[from] RestError),

    /// Schema resolution failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// License file failure.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// A response did not have the expected shape.
    #[error("unexpected response from {method}: {message}")]
    InvalidResponse {
        /// Method or path that produced the response.
        method: String,
        /// What was wrong with it.
        message: String,
    },

    /// A dotted method name was rejected.
    #[error(transparent)]
    InvalidMethodName(#[from] MethodNameError),

    /// The configuration does not describe a usable endpoint.
    #[error(transparent)]
    Config(#[from] oa_config::ConfigError),
}

impl From<RemoteCallError> for ApiError {
    fn from(error: RemoteCallError) -> Self {
        Self::RemoteCall(Box::new(error))
    }
}

impl ApiError {
    /// The remote application failure, if this is one.
    #[must_use]
    pub fn remote_call(&self) -> Option<&RemoteCallError> {
        match self {
            Self::RemoteCall(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` for a remote failure carrying `module`/`code`.
    #[must_use]
    pub fn is_remote(&self, module: &str, code: i64) -> bool {
        self.remote_call().is_some_and(|error| error.is(module, code))
    }

    /// Returns `true` for a remote failure matching `known`.
    #[must_use]
    pub fn is_known(&self, known: KnownError) -> bool {
        self.is_remote(known.module, known.code)
    }

    /// Returns `true` when the platform reported the failure, either
    /// directly or through a failed asynchronous request.
    #[must_use]
    pub const fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteCall(_) | Self::AsyncFailed { .. })
    }

    /// Returns `true` for [`ApiError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn invalid_response(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method: method.to_owned(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests;
