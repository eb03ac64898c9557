use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use super::error::{ApsErrorBody, RestError};
use super::{REST_TARGET, RestRequest, Verb};

/// Sends one REST request to a controller endpoint.
///
/// [`HttpRestTransport`] is the production implementation.
pub trait RestTransport {
    /// Sends `request` to `endpoint` and returns the JSON response body.
    /// An empty body yields JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] for non-success statuses, carrying the
    /// parsed APS error body when present, and other [`RestError`] variants
    /// for transport and decoding failures.
    fn send(&self, endpoint: &Url, request: &RestRequest) -> Result<serde_json::Value, RestError>;
}

impl<T: RestTransport + ?Sized> RestTransport for &T {
    fn send(&self, endpoint: &Url, request: &RestRequest) -> Result<serde_json::Value, RestError> {
        (**self).send(endpoint, request)
    }
}

impl<T: RestTransport + ?Sized> RestTransport for Arc<T> {
    fn send(&self, endpoint: &Url, request: &RestRequest) -> Result<serde_json::Value, RestError> {
        (**self).send(endpoint, request)
    }
}

/// REST over blocking HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRestTransport {
    client: Client,
}

impl HttpRestTransport {
    /// Creates a transport with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Transport`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

const fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Put => Method::PUT,
        Verb::Post => Method::POST,
        Verb::Delete => Method::DELETE,
    }
}

impl RestTransport for HttpRestTransport {
    fn send(&self, endpoint: &Url, request: &RestRequest) -> Result<serde_json::Value, RestError> {
        let url = request.url(endpoint)?;
        debug!(target: REST_TARGET, verb = %request.verb(), %url, "sending request");

        let mut builder = self.client.request(method_for(request.verb()), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.json_body() {
            builder = builder.json(body);
        }
        let response = builder.send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RestError::Status {
                verb: request.verb(),
                path: request.path().to_string(),
                status: status.as_u16(),
                aps: serde_json::from_str::<ApsErrorBody>(&text).ok().map(Box::new),
            });
        }
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| RestError::Decode {
            message: error.to_string(),
        })
    }
}
