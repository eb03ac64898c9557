//! XML-RPC plumbing for the platform's OpenAPI endpoint.
//!
//! The platform takes keyword arguments as a single struct parameter and
//! answers with an envelope (`status`, `result`, `error_message`,
//! `module_id`, `extype_id`). This module only moves [`Value`]s over the
//! wire; interpreting the envelope is the dispatcher's job.

pub mod codec;
mod error;
mod method;
mod params;
mod transport;
mod value;

pub use self::error::RpcError;
pub use self::method::{MethodName, MethodNameError};
pub use self::params::Params;
pub use self::transport::{HttpRpcTransport, RpcTransport};
pub use self::value::Value;

/// Tracing target for XML-RPC traffic.
pub(crate) const RPC_TARGET: &str = "oa_api::rpc";
