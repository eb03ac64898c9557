use std::fmt;

use url::Url;

/// APS token together with the controller it is valid for.
///
/// Tokens are replaced wholesale on renewal; callers obtain the current one
/// through [`Dispatcher::auth_token`](super::Dispatcher::auth_token) and
/// must not keep it across calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    token: String,
    endpoint: Url,
}

impl AuthToken {
    /// Pairs a token with its controller endpoint.
    #[must_use]
    pub const fn new(token: String, endpoint: Url) -> Self {
        Self { token, endpoint }
    }

    /// The opaque token value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The controller URI REST calls are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"***")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}
