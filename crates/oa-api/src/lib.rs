//! Client for the platform's OpenAPI (XML-RPC) and APS (REST) interfaces.
//!
//! The crate has two halves. The [`schema`] module turns the JSON object-model
//! descriptions served by the APS controller into [`TypeDescriptor`] values,
//! memoised in a process-wide [`TypeRegistry`] keyed by a canonical content
//! fingerprint. The [`dispatcher`] module executes remote calls in three
//! modes: synchronous XML-RPC, asynchronous XML-RPC wrapped in a
//! begin/commit transaction, and asynchronous calls that poll the request
//! status until completion. REST calls carry an `APS-Token` header which the
//! dispatcher renews once, transparently, when the controller reports it
//! expired.
//!
//! [`OaApi`] layers the provisioning operations (licensing, module
//! installation, name server registration) on top of the dispatcher.
//!
//! # Example
//!
//! ```rust,no_run
//! use oa_api::OaApi;
//! use oa_config::Config;
//!
//! # fn main() -> Result<(), oa_api::ApiError> {
//! let api = OaApi::connect(&Config::default())?;
//! if !api.has_active_license()? {
//!     // upload a license here
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod license;
pub mod operations;
pub mod rest;
pub mod rpc;
pub mod schema;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use self::dispatcher::{AuthToken, Dispatcher, RequestHandle, RequestStatus};
pub use self::error::{ApiError, KnownError, RemoteCallError};
pub use self::license::{LicenseError, LicenseFile};
pub use self::operations::{NameServerRegistration, OaApi};
pub use self::rest::{RestError, RestPath, RestRequest, RestTransport, Verb};
pub use self::rpc::{MethodName, Params, RpcError, RpcTransport, Value};
pub use self::schema::{
    SchemaError, SchemaFingerprint, SchemaInput, SchemaSource, TypeDescriptor, TypeGenerator,
    TypeKind, TypeRegistry,
};
