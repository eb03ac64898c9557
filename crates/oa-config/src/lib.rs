//! Shared configuration for the provisioning toolchain.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! TOML file (`--config-path` or `OA_CONFIG_PATH`), then `OA_*` environment
//! variables, then command-line flags. The resolved [`Config`] tells the API
//! client where the platform's XML-RPC endpoint lives, how long asynchronous
//! operations may run, and how the binaries should emit telemetry.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_ACCOUNT_ID, DEFAULT_ASYNC_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_FILTER,
    DEFAULT_OPENAPI_URL, DEFAULT_SUBSCRIPTION_ID, default_account_id, default_async_timeout_secs,
    default_http_timeout_secs, default_log_filter, default_log_filter_string, default_log_format,
    default_openapi_url, default_subscription_id,
};
pub use logging::LogFormat;

/// Runtime configuration shared by the API client and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "OA")]
pub struct Config {
    /// XML-RPC endpoint of the platform's management node.
    #[serde(default = "default_openapi_url")]
    #[ortho_config(default = default_openapi_url())]
    pub openapi_url: String,
    /// Seconds an asynchronous call may run before waiting gives up.
    #[serde(default = "default_async_timeout_secs")]
    #[ortho_config(default = default_async_timeout_secs())]
    pub async_timeout_secs: u64,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    #[ortho_config(default = default_http_timeout_secs())]
    pub http_timeout_secs: u64,
    /// Account used for the privileged REST token call.
    #[serde(default = "default_account_id")]
    #[ortho_config(default = default_account_id())]
    pub account_id: u64,
    /// Subscription used for the privileged REST token call.
    #[serde(default = "default_subscription_id")]
    #[ortho_config(default = default_subscription_id())]
    pub subscription_id: u64,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Optional file receiving log records instead of standard error.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openapi_url: default_openapi_url(),
            async_timeout_secs: DEFAULT_ASYNC_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            account_id: DEFAULT_ACCOUNT_ID,
            subscription_id: DEFAULT_SUBSCRIPTION_ID,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
        }
    }
}

impl Config {
    /// Raw XML-RPC endpoint as configured.
    #[must_use]
    pub fn openapi_url(&self) -> &str {
        self.openapi_url.as_str()
    }

    /// Parses the XML-RPC endpoint, rejecting anything that is not HTTP(S).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] when the value does not parse
    /// as a URL or uses a scheme other than `http`/`https`.
    pub fn openapi_endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.openapi_url).map_err(|source| ConfigError::InvalidEndpoint {
            value: self.openapi_url.clone(),
            message: source.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidEndpoint {
                value: self.openapi_url.clone(),
                message: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    /// Default timeout applied to asynchronous calls that wait for completion.
    #[must_use]
    pub const fn async_timeout(&self) -> Duration {
        Duration::from_secs(self.async_timeout_secs)
    }

    /// Timeout applied to each HTTP exchange.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Account used for the token call.
    #[must_use]
    pub const fn account_id(&self) -> u64 {
        self.account_id
    }

    /// Subscription used for the token call.
    #[must_use]
    pub const fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    /// Account and subscription as the signed integers the platform expects.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when either exceeds `i64::MAX`.
    pub fn token_owner(&self) -> Result<(i64, i64), ConfigError> {
        let signed = |field: &'static str, value: u64| {
            i64::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
        };
        Ok((
            signed("account_id", self.account_id)?,
            signed("subscription_id", self.subscription_id)?,
        ))
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Optional log destination.
    #[must_use]
    pub fn log_file(&self) -> Option<&camino::Utf8Path> {
        self.log_file.as_deref()
    }
}

/// Errors raised while interpreting configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The XML-RPC endpoint is not a usable URL.
    #[error("invalid OpenAPI endpoint '{value}': {message}")]
    InvalidEndpoint {
        /// Configured value.
        value: String,
        /// Reason the value was rejected.
        message: String,
    },

    /// A numeric identifier does not fit the platform's signed integers.
    #[error("{field} {value} is out of range")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: u64,
    },
}
