use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::RPC_TARGET;
use super::codec::{decode_response, encode_call};
use super::error::RpcError;
use super::method::MethodName;
use super::value::Value;

/// Delivers one XML-RPC call and returns the decoded response value.
///
/// [`HttpRpcTransport`] is the production implementation. Tests substitute
/// scripted transports.
///
/// ```
/// use oa_api::{MethodName, RpcError, RpcTransport, Value};
///
/// struct Echo;
///
/// impl RpcTransport for Echo {
///     fn invoke(&self, _method: &MethodName, params: &[Value]) -> Result<Value, RpcError> {
///         Ok(params.first().cloned().unwrap_or(Value::Nil))
///     }
/// }
/// ```
pub trait RpcTransport {
    /// Sends `method` with positional `params`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] for faults, transport failures and malformed
    /// responses.
    fn invoke(&self, method: &MethodName, params: &[Value]) -> Result<Value, RpcError>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for &T {
    fn invoke(&self, method: &MethodName, params: &[Value]) -> Result<Value, RpcError> {
        (**self).invoke(method, params)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    fn invoke(&self, method: &MethodName, params: &[Value]) -> Result<Value, RpcError> {
        (**self).invoke(method, params)
    }
}

/// XML-RPC over blocking HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpRpcTransport {
    client: Client,
    endpoint: Url,
}

impl HttpRpcTransport {
    /// Creates a transport posting to `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] when the HTTP client cannot be built.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl RpcTransport for HttpRpcTransport {
    fn invoke(&self, method: &MethodName, params: &[Value]) -> Result<Value, RpcError> {
        debug!(target: RPC_TARGET, method = %method, endpoint = %self.endpoint, "sending call");
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(encode_call(method, params))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        decode_response(&body)
    }
}
