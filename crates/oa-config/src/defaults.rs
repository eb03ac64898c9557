/// Default XML-RPC endpoint of the platform's management node.
pub const DEFAULT_OPENAPI_URL: &str = "http://127.0.0.1:8440/RPC2";

/// Default timeout, in seconds, for asynchronous calls that wait for completion.
pub const DEFAULT_ASYNC_TIMEOUT_SECS: u64 = 120;

/// Default per-request HTTP timeout, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Account used when requesting REST tokens.
pub const DEFAULT_ACCOUNT_ID: u64 = 1;

/// Subscription used when requesting REST tokens.
pub const DEFAULT_SUBSCRIPTION_ID: u64 = 0;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default XML-RPC endpoint as an owned value for serde.
pub fn default_openapi_url() -> String {
    DEFAULT_OPENAPI_URL.to_owned()
}

/// Default asynchronous wait timeout in seconds.
pub const fn default_async_timeout_secs() -> u64 {
    DEFAULT_ASYNC_TIMEOUT_SECS
}

/// Default HTTP timeout in seconds.
pub const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Default token account.
pub const fn default_account_id() -> u64 {
    DEFAULT_ACCOUNT_ID
}

/// Default token subscription.
pub const fn default_subscription_id() -> u64 {
    DEFAULT_SUBSCRIPTION_ID
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
