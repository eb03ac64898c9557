//! REST access to the APS controller.
//!
//! Paths are rooted at `/aps/2/`; queries are raw RQL strings appended after
//! `?`. Authentication is a header added by the dispatcher, so requests built
//! here never carry a token themselves.

mod error;
mod transport;

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

pub use self::error::{ApsErrorBody, RestError};
pub use self::transport::{HttpRestTransport, RestTransport};

/// Header carrying the APS token.
pub const TOKEN_HEADER: &str = "APS-Token";

/// Tracing target for REST traffic.
pub(crate) const REST_TARGET: &str = "oa_api::rest";

/// HTTP verbs understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// Upper-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hierarchical controller path. Every segment is followed by `/`.
///
/// ```
/// use oa_api::RestPath;
///
/// let path = RestPath::aps().join("resources").join(42);
/// assert_eq!(path.as_str(), "/aps/2/resources/42/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestPath(String);

impl RestPath {
    /// The APS root, `/aps/2/`.
    #[must_use]
    pub fn aps() -> Self {
        Self(String::from("/aps/2/"))
    }

    /// Appends a segment.
    #[must_use]
    pub fn join(mut self, segment: impl fmt::Display) -> Self {
        self.0.push_str(&segment.to_string());
        self.0.push('/');
        self
    }

    /// The path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One REST call.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    verb: Verb,
    path: RestPath,
    query: Option<String>,
    headers: BTreeMap<String, String>,
    body: Option<serde_json::Value>,
}

impl RestRequest {
    /// Creates a request without query, headers or body.
    #[must_use]
    pub const fn new(verb: Verb, path: RestPath) -> Self {
        Self {
            verb,
            path,
            query: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET`.
    #[must_use]
    pub const fn get(path: RestPath) -> Self {
        Self::new(Verb::Get, path)
    }

    /// Sets the RQL query, without the leading `?`.
    #[must_use]
    pub fn query(mut self, rql: impl Into<String>) -> Self {
        self.query = Some(rql.into());
        self
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_owned(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The verb.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// The path.
    #[must_use]
    pub const fn path(&self) -> &RestPath {
        &self.path
    }

    /// The RQL query, if any.
    #[must_use]
    pub fn rql(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Headers to send.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The JSON body, if any.
    #[must_use]
    pub const fn json_body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Absolute URL of the request under `endpoint`.
    ///
    /// The path is appended to the endpoint text, so an endpoint path prefix
    /// is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidUrl`] when the result does not parse.
    pub fn url(&self, endpoint: &Url) -> Result<Url, RestError> {
        let mut text = endpoint.as_str().trim_end_matches('/').to_owned();
        text.push_str(self.path.as_str());
        if let Some(rql) = &self.query {
            text.push('?');
            text.push_str(rql);
        }
        Url::parse(&text).map_err(|error| RestError::InvalidUrl {
            url: text,
            message: error.to_string(),
        })
    }
}
