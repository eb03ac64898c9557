//! In-memory transports for exercising the client without a platform.
//!
//! [`FakePlatform`] answers the transaction, status and token methods the
//! dispatcher relies on and delegates everything else to per-method
//! handlers. [`ScriptedRest`] answers REST requests through a closure. Both
//! record what they receive.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::rest::{ApsErrorBody, RestError, RestRequest, RestTransport, TOKEN_HEADER, Verb};
use crate::rpc::{MethodName, RpcError, RpcTransport, Value};

/// Controller URI handed out with fake tokens.
pub const CONTROLLER_URI: &str = "https://controller.test:6308/";

/// Wraps `result` in a successful platform envelope.
#[must_use]
pub fn ok(result: Value) -> Value {
    Value::Struct(BTreeMap::from([
        ("status".to_owned(), Value::Int(0)),
        ("result".to_owned(), result),
    ]))
}

/// A failed platform envelope.
#[must_use]
pub fn failure(module: &str, code: i64, message: &str) -> Value {
    Value::Struct(BTreeMap::from([
        ("status".to_owned(), Value::Int(-1)),
        ("module_id".to_owned(), Value::from(module)),
        ("extype_id".to_owned(), Value::Int(code)),
        ("error_message".to_owned(), Value::from(message)),
    ]))
}

/// Builds a struct value from `(key, value)` pairs.
#[must_use]
pub fn record<const N: usize>(members: [(&str, Value); N]) -> Value {
    Value::Struct(
        members
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect(),
    )
}

/// A REST status error with an APS body.
#[must_use]
pub fn rest_status(status: u16, message: &str) -> RestError {
    RestError::Status {
        verb: Verb::Get,
        path: String::from("/aps/2/"),
        status,
        aps: Some(Box::new(ApsErrorBody {
            code: Some(i64::from(status)),
            error_type: None,
            message: message.to_owned(),
        })),
    }
}

/// The controller's answer to a request with an expired token.
#[must_use]
pub fn token_expired() -> RestError {
    rest_status(403, "Token expired")
}

/// One recorded XML-RPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Dotted method name.
    pub method: String,
    /// The keyword-argument struct.
    pub args: Value,
}

type MethodHandler = Box<dyn Fn(&Value) -> Result<Value, RpcError> + Send + Sync>;

/// Scripted platform endpoint.
///
/// Built-in behaviour, unless overridden with [`FakePlatform::on`]:
///
/// * `pem.beginRequest` returns increasing request ids starting at 1;
/// * `pem.commit` and `pem.rollback` succeed;
/// * `pem.getRequestStatus` replays the codes given to
///   [`FakePlatform::with_statuses`], repeating the last one (default `0`);
/// * `pem.APS.getAccountToken` issues `token-1`, `token-2`, ... for
///   [`CONTROLLER_URI`].
///
/// Any other method without a handler answers with an XML-RPC fault.
pub struct FakePlatform {
    handlers: HashMap<String, MethodHandler>,
    statuses: Mutex<VecDeque<i64>>,
    next_request: AtomicI64,
    tokens_issued: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakePlatform")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

impl FakePlatform {
    /// Creates a platform with only the built-in methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            statuses: Mutex::new(VecDeque::new()),
            next_request: AtomicI64::new(1),
            tokens_issued: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the sequence of `request_status` codes.
    #[must_use]
    pub fn with_statuses(self, codes: impl IntoIterator<Item = i64>) -> Self {
        *self.statuses.lock().unwrap_or_else(PoisonError::into_inner) = codes.into_iter().collect();
        self
    }

    /// Answers `method` with the envelope returned by `handler`.
    #[must_use]
    pub fn on(
        mut self,
        method: &str,
        handler: impl Fn(&Value) -> Result<Value, RpcError> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(method.to_owned(), Box::new(handler));
        self
    }

    /// Answers `method` successfully with `result`.
    #[must_use]
    pub fn respond(self, method: &str, result: Value) -> Self {
        self.on(method, move |_| Ok(ok(result.clone())))
    }

    /// Answers `method` with a platform failure.
    #[must_use]
    pub fn fail(self, method: &str, module: &str, code: i64, message: &str) -> Self {
        let envelope = failure(module, code, message);
        self.on(method, move |_| Ok(envelope.clone()))
    }

    /// Every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Method names received, in order.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    /// Number of calls to `method`.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Arguments of the last call to `method`.
    #[must_use]
    pub fn last_args(&self, method: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| call.method == method)
            .map(|call| call.args)
    }

    /// Number of tokens issued so far.
    #[must_use]
    pub fn tokens_issued(&self) -> usize {
        self.tokens_issued.load(Ordering::SeqCst)
    }

    fn builtin(&self, method: &str) -> Result<Value, RpcError> {
        match method {
            "pem.beginRequest" => Ok(ok(Value::Int(
                self.next_request.fetch_add(1, Ordering::SeqCst),
            ))),
            "pem.commit" | "pem.rollback" => Ok(ok(Value::Nil)),
            "pem.getRequestStatus" => {
                let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
                let code = if statuses.len() > 1 {
                    statuses.pop_front()
                } else {
                    statuses.front().copied()
                };
                Ok(ok(record([(
                    "request_status",
                    Value::Int(code.unwrap_or(0)),
                )])))
            }
            "pem.APS.getAccountToken" => {
                let issued = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(ok(record([
                    ("aps_token", Value::from(format!("token-{issued}"))),
                    ("controller_uri", Value::from(CONTROLLER_URI)),
                ])))
            }
            other => Err(RpcError::Fault {
                code: -32601,
                message: format!("no such method: {other}"),
            }),
        }
    }
}

impl RpcTransport for FakePlatform {
    fn invoke(&self, method: &MethodName, params: &[Value]) -> Result<Value, RpcError> {
        let args = params.first().cloned().unwrap_or(Value::Nil);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method: method.to_string(),
                args: args.clone(),
            });
        self.handlers
            .get(method.as_str())
            .map_or_else(|| self.builtin(method.as_str()), |handler| handler(&args))
    }
}

type RestHandler = Box<dyn Fn(&RestRequest) -> Result<serde_json::Value, RestError> + Send + Sync>;

/// REST transport answering through a closure.
pub struct ScriptedRest {
    handler: RestHandler,
    requests: Mutex<Vec<(Url, RestRequest)>>,
}

impl fmt::Debug for ScriptedRest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRest")
            .field("requests", &self.requests().len())
            .finish_non_exhaustive()
    }
}

impl ScriptedRest {
    /// Answers every request with `handler`.
    #[must_use]
    pub fn new(
        handler: impl Fn(&RestRequest) -> Result<serde_json::Value, RestError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request with HTTP 503.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::new(|_| Err(rest_status(503, "Service unavailable")))
    }

    /// Every request received with the endpoint it was sent to.
    #[must_use]
    pub fn requests(&self) -> Vec<(Url, RestRequest)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The token header of every request, in order.
    #[must_use]
    pub fn tokens_sent(&self) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .map(|(_, request)| request.headers().get(TOKEN_HEADER).cloned())
            .collect()
    }
}

impl RestTransport for ScriptedRest {
    fn send(&self, endpoint: &Url, request: &RestRequest) -> Result<serde_json::Value, RestError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint.clone(), request.clone()));
        (self.handler)(request)
    }
}

/// Token carried by a request.
#[must_use]
pub fn token_of(request: &RestRequest) -> Option<&str> {
    request.headers().get(TOKEN_HEADER).map(String::as_str)
}
