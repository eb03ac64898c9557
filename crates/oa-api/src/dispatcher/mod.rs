//! Remote call execution over XML-RPC and REST.
//!
//! The [`Dispatcher`] offers four invocation modes:
//!
//! * [`Dispatcher::call_sync`] runs a method and unwraps the platform's
//!   result envelope;
//! * [`Dispatcher::call_async`] runs a method inside a
//!   `pem.beginRequest`/`pem.commit` transaction and returns the request
//!   handle with the preliminary result;
//! * [`Dispatcher::call_async_wait`] additionally polls
//!   `pem.getRequestStatus` every `timeout / 20` until the request succeeds,
//!   fails, or the timeout elapses;
//! * [`Dispatcher::call_rest`] sends a REST request with the current APS
//!   token, renewing the token and retrying once when the controller reports
//!   it expired.
//!
//! The token lives behind a lock and is replaced, never mutated. A renewal
//! only fetches a new token when the expired one is still current, so
//! concurrent callers that hit the same expiry share one renewal.

mod status;
mod token;

use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use url::Url;

pub use self::status::{RequestHandle, RequestStatus};
pub use self::token::AuthToken;
use crate::error::{ApiError, RemoteCallError};
use crate::rest::{RestError, RestRequest, RestTransport, TOKEN_HEADER};
use crate::rpc::{MethodName, Params, RpcError, RpcTransport, Value};

/// Tracing target for dispatcher activity.
const DISPATCH_TARGET: &str = "oa_api::dispatcher";

/// Status checks per wait budget.
const POLLS_PER_TIMEOUT: u32 = 20;

fn pem(method: &str) -> MethodName {
    MethodName::root("pem").child(method)
}

/// Executes remote calls against one platform installation.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use oa_api::{Dispatcher, MethodName, Params, RpcError, RpcTransport, Value};
///
/// struct Pong;
///
/// impl RpcTransport for Pong {
///     fn invoke(&self, _method: &MethodName, _params: &[Value]) -> Result<Value, RpcError> {
///         Ok(Value::Struct(BTreeMap::from([
///             ("status".to_owned(), Value::Int(0)),
///             ("result".to_owned(), Value::from("pong")),
///         ])))
///     }
/// }
///
/// let dispatcher = Dispatcher::new(Pong, ());
/// let method = MethodName::parse("pem.ping").unwrap();
/// let result = dispatcher.call_sync(&method, &Params::new()).unwrap();
/// assert_eq!(result.as_str(), Some("pong"));
/// ```
#[derive(Debug)]
pub struct Dispatcher<R, H> {
    rpc: R,
    rest: H,
    token: RwLock<Option<Arc<AuthToken>>>,
    async_timeout: Duration,
    account_id: i64,
    subscription_id: i64,
}

impl<R, H> Dispatcher<R, H> {
    /// Default wait budget for [`Dispatcher::call_async_wait`].
    pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(120);

    /// Creates a dispatcher with the default wait budget, requesting tokens
    /// for account `1`, subscription `0`.
    #[must_use]
    pub const fn new(rpc: R, rest: H) -> Self {
        Self {
            rpc,
            rest,
            token: RwLock::new(None),
            async_timeout: Self::DEFAULT_ASYNC_TIMEOUT,
            account_id: 1,
            subscription_id: 0,
        }
    }

    /// Sets the default wait budget.
    #[must_use]
    pub const fn with_async_timeout(mut self, timeout: Duration) -> Self {
        self.async_timeout = timeout;
        self
    }

    /// Sets the account and subscription tokens are requested for.
    #[must_use]
    pub const fn with_token_owner(mut self, account_id: i64, subscription_id: i64) -> Self {
        self.account_id = account_id;
        self.subscription_id = subscription_id;
        self
    }

    /// The default wait budget.
    #[must_use]
    pub const fn async_timeout(&self) -> Duration {
        self.async_timeout
    }

    /// The XML-RPC transport.
    #[must_use]
    pub const fn rpc(&self) -> &R {
        &self.rpc
    }

    /// The REST transport.
    #[must_use]
    pub const fn rest(&self) -> &H {
        &self.rest
    }

    /// The token currently held, without acquiring one.
    #[must_use]
    pub fn current_token(&self) -> Option<Arc<AuthToken>> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<R: RpcTransport, H> Dispatcher<R, H> {
    /// Invokes `method` and unwraps the result envelope.
    ///
    /// # Errors
    ///
    /// * [`ApiError::RemoteCall`] when the platform reports a failure or
    ///   answers with an XML-RPC fault.
    /// * [`ApiError::Rpc`] for transport failures.
    /// * [`ApiError::InvalidResponse`] when the envelope has no `status`.
    pub fn call_sync(&self, method: &MethodName, params: &Params) -> Result<Value, ApiError> {
        debug!(target: DISPATCH_TARGET, method = %method, "sync call");
        let envelope = self
            .rpc
            .invoke(method, &[params.to_value()])
            .map_err(|error| lift_fault(method, error))?;
        unwrap_envelope(method, envelope)
    }

    /// Invokes `method` inside a platform transaction.
    ///
    /// `params` reach the method unchanged; the transaction is bound to the
    /// session by `pem.beginRequest`. If the call fails the transaction is
    /// rolled back on a best-effort basis and the call's error is returned.
    ///
    /// # Errors
    ///
    /// * The errors of [`Dispatcher::call_sync`] for the begin and the call.
    /// * [`ApiError::CommitFailed`] when the call succeeded but
    ///   `pem.commit` did not.
    pub fn call_async(
        &self,
        method: &MethodName,
        params: &Params,
    ) -> Result<(RequestHandle, Value), ApiError> {
        let handle = self.begin_request()?;

        debug!(
            target: DISPATCH_TARGET,
            method = %method,
            request_id = handle.id(),
            "async call"
        );
        let result = match self.call_sync(method, params) {
            Ok(result) => result,
            Err(error) => {
                self.rollback(handle);
                return Err(error);
            }
        };

        self.call_sync(&pem("commit"), &request_params(handle))
            .map_err(|source| ApiError::CommitFailed {
                method: method.to_string(),
                request_id: handle.id(),
                source: Box::new(source),
            })?;
        Ok((handle, result))
    }

    /// Runs [`Dispatcher::call_async`] and waits for the request to finish.
    ///
    /// `timeout` defaults to [`Dispatcher::async_timeout`]. The status is
    /// polled every `timeout / 20`; elapsed time is checked after every poll.
    ///
    /// # Errors
    ///
    /// * The errors of [`Dispatcher::call_async`].
    /// * [`ApiError::AsyncFailed`] when the request reaches status `2`.
    /// * [`ApiError::Timeout`] when no terminal status is seen in time.
    pub fn call_async_wait(
        &self,
        method: &MethodName,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<Value, ApiError> {
        let budget = timeout.unwrap_or(self.async_timeout);
        let interval = budget / POLLS_PER_TIMEOUT;
        let started = Instant::now();
        let (handle, result) = self.call_async(method, params)?;

        loop {
            match self.request_status(handle)? {
                RequestStatus::Succeeded => {
                    info!(
                        target: DISPATCH_TARGET,
                        method = %method,
                        request_id = handle.id(),
                        elapsed_ms = elapsed_ms(started),
                        "request completed"
                    );
                    return Ok(result);
                }
                RequestStatus::Failed => {
                    warn!(
                        target: DISPATCH_TARGET,
                        method = %method,
                        request_id = handle.id(),
                        "request failed"
                    );
                    return Err(ApiError::AsyncFailed {
                        method: method.to_string(),
                        args: params.clone(),
                        request_id: handle.id(),
                        status: RequestStatus::Failed.code(),
                    });
                }
                RequestStatus::Running(code) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        request_id = handle.id(),
                        status = code,
                        "request still running"
                    );
                }
            }

            if started.elapsed() > budget {
                return Err(ApiError::Timeout {
                    method: method.to_string(),
                    args: params.clone(),
                    timeout: budget,
                });
            }
            thread::sleep(interval);
        }
    }

    /// Fetches the status of an asynchronous request.
    ///
    /// # Errors
    ///
    /// The errors of [`Dispatcher::call_sync`], and
    /// [`ApiError::InvalidResponse`] when `request_status` is missing.
    pub fn request_status(&self, handle: RequestHandle) -> Result<RequestStatus, ApiError> {
        let method = pem("getRequestStatus");
        let result = self.call_sync(&method, &request_params(handle))?;
        result
            .get("request_status")
            .and_then(Value::as_i64)
            .map(RequestStatus::from_code)
            .ok_or_else(|| {
                ApiError::invalid_response(method.as_str(), "missing integer request_status")
            })
    }

    /// Returns `true` while the request is in flight.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::request_status`].
    pub fn is_running_request(&self, handle: RequestHandle) -> Result<bool, ApiError> {
        Ok(!self.request_status(handle)?.is_terminal())
    }

    /// Returns `true` when the request has failed.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::request_status`].
    pub fn is_failed_request(&self, handle: RequestHandle) -> Result<bool, ApiError> {
        Ok(self.request_status(handle)? == RequestStatus::Failed)
    }

    /// Lists the methods the endpoint exposes.
    ///
    /// `system.listMethods` is answered without the platform envelope.
    ///
    /// # Errors
    ///
    /// [`ApiError::Rpc`] or [`ApiError::RemoteCall`] when the call fails,
    /// [`ApiError::InvalidResponse`] when the answer is not a string list.
    pub fn list_methods(&self) -> Result<Vec<String>, ApiError> {
        let method = MethodName::root("system").child("listMethods");
        let answer = self
            .rpc
            .invoke(&method, &[Params::new().to_value()])
            .map_err(|error| lift_fault(&method, error))?;
        answer
            .as_array()
            .and_then(|names| {
                names
                    .iter()
                    .map(|name| name.as_str().map(str::to_owned))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| ApiError::invalid_response(method.as_str(), "expected a string list"))
    }

    /// Describes the arguments of a platform method.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`].
    pub fn method_signature(&self, method_name: &str) -> Result<Value, ApiError> {
        self.call_sync(
            &pem("getMethodSignature"),
            &Params::new().arg("method_name", method_name),
        )
    }

    fn begin_request(&self) -> Result<RequestHandle, ApiError> {
        let method = pem("beginRequest");
        let result = self.call_sync(&method, &Params::new())?;
        result
            .as_i64()
            .or_else(|| result.get("request_id").and_then(Value::as_i64))
            .map(RequestHandle::new)
            .ok_or_else(|| ApiError::invalid_response(method.as_str(), "missing request id"))
    }

    fn rollback(&self, handle: RequestHandle) {
        if let Err(error) = self.call_sync(&pem("rollback"), &request_params(handle)) {
            warn!(
                target: DISPATCH_TARGET,
                request_id = handle.id(),
                error = %error,
                "rollback failed"
            );
        }
    }

    fn fetch_token(&self) -> Result<AuthToken, ApiError> {
        let method = pem("APS").child("getAccountToken");
        let params = Params::new()
            .arg("account_id", self.account_id)
            .arg("subscription_id", self.subscription_id);
        let result = self.call_sync(&method, &params)?;

        let token = result
            .get("aps_token")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::invalid_response(method.as_str(), "missing aps_token"))?;
        let controller = result
            .get("controller_uri")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::invalid_response(method.as_str(), "missing controller_uri"))?;
        let endpoint = Url::parse(controller).map_err(|error| {
            ApiError::invalid_response(
                method.as_str(),
                format!("invalid controller_uri '{controller}': {error}"),
            )
        })?;
        debug!(target: DISPATCH_TARGET, controller = %endpoint, "acquired APS token");
        Ok(AuthToken::new(token.to_owned(), endpoint))
    }

    /// The current APS token, acquired on first use.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`], plus [`ApiError::InvalidResponse`]
    /// when the token answer is incomplete.
    pub fn auth_token(&self) -> Result<Arc<AuthToken>, ApiError> {
        if let Some(current) = self.current_token() {
            return Ok(current);
        }
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = slot.as_ref() {
            return Ok(Arc::clone(current));
        }
        let fresh = Arc::new(self.fetch_token()?);
        *slot = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Replaces `expired` with a freshly acquired token. When another caller
    /// already replaced it, that token is returned instead.
    fn renew_token(&self, expired: &Arc<AuthToken>) -> Result<Arc<AuthToken>, ApiError> {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = slot.as_ref() {
            if !Arc::ptr_eq(current, expired) {
                return Ok(Arc::clone(current));
            }
        }
        info!(target: DISPATCH_TARGET, "APS token expired, renewing");
        let fresh = Arc::new(self.fetch_token()?);
        *slot = Some(Arc::clone(&fresh));
        Ok(fresh)
    }
}

impl<R: RpcTransport, H: RestTransport> Dispatcher<R, H> {
    /// Sends a REST request with the current APS token.
    ///
    /// A 403 reporting `Token expired` triggers one token renewal and one
    /// retry; any failure of the retry is returned as is.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Rest`] for REST failures.
    /// * The errors of [`Dispatcher::auth_token`] when no token can be
    ///   acquired.
    pub fn call_rest(&self, request: &RestRequest) -> Result<serde_json::Value, ApiError> {
        let token = self.auth_token()?;
        debug!(
            target: DISPATCH_TARGET,
            verb = %request.verb(),
            path = %request.path(),
            "REST call"
        );
        match self.send_with(&token, request) {
            Err(error) if error.is_token_expired() => {
                let renewed = self.renew_token(&token)?;
                self.send_with(&renewed, request).map_err(ApiError::from)
            }
            other => other.map_err(ApiError::from),
        }
    }

    fn send_with(
        &self,
        token: &AuthToken,
        request: &RestRequest,
    ) -> Result<serde_json::Value, RestError> {
        let authorised = request.clone().header(TOKEN_HEADER, token.token());
        self.rest.send(token.endpoint(), &authorised)
    }
}

fn request_params(handle: RequestHandle) -> Params {
    Params::new().arg("request_id", handle.id())
}

/// Turns an XML-RPC fault into a remote call failure; other transport
/// errors pass through.
fn lift_fault(method: &MethodName, error: RpcError) -> ApiError {
    if let RpcError::Fault { code, message } = &error {
        let fault_code = *code;
        let summary = message.clone();
        return RemoteCallError::from_fault(method.as_str(), fault_code, &summary, error).into();
    }
    ApiError::Rpc(error)
}

fn unwrap_envelope(method: &MethodName, envelope: Value) -> Result<Value, ApiError> {
    let status = envelope
        .get("status")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::invalid_response(method.as_str(), "missing envelope status"))?;
    if status != 0 {
        return Err(RemoteCallError::from_envelope(method.as_str(), &envelope).into());
    }
    match envelope {
        Value::Struct(mut members) => Ok(members.remove("result").unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
