//! Provisioning operations built on the dispatcher.
//!
//! [`OaApi`] bundles a [`Dispatcher`] with a [`TypeGenerator`] and exposes
//! the platform calls a provisioning run needs: license management, APS
//! type lookup, module installation and name server registration.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::error::{ApiError, KnownError};
use crate::license::LicenseFile;
use crate::rest::{HttpRestTransport, RestPath, RestRequest, RestTransport};
use crate::rpc::{HttpRpcTransport, MethodName, Params, RpcTransport, Value};
use crate::schema::{SchemaError, SchemaSource, TypeDescriptor, TypeGenerator};

const OPERATIONS_TARGET: &str = "oa_api::operations";

/// APS type implemented by license resources.
pub const PRODUCT_LICENSE_TYPE: &str = "http://parallels.com/aps/types/pa/productLicense/1.1";

/// Login used for name server registration unless overridden.
pub const DEFAULT_NS_LOGIN: &str = "root";

fn pem(path: &[&str]) -> MethodName {
    path.iter()
        .fold(MethodName::root("pem"), |method, segment| method.child(segment))
}

/// Arguments of [`OaApi::register_name_server`].
///
/// The password is masked whenever the arguments are displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServerRegistration {
    backnet: String,
    frontnet: String,
    hostname: Option<String>,
    login: String,
    password: String,
}

impl NameServerRegistration {
    /// Registration of the node reachable at `backnet`, serving DNS on
    /// `frontnet`, logging in as [`DEFAULT_NS_LOGIN`].
    #[must_use]
    pub fn new(
        backnet: impl Into<String>,
        frontnet: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            backnet: backnet.into(),
            frontnet: frontnet.into(),
            hostname: None,
            login: DEFAULT_NS_LOGIN.to_owned(),
            password: password.into(),
        }
    }

    /// Renames the node on registration.
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Overrides the login used to reach the node.
    #[must_use]
    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = login.into();
        self
    }

    /// Backnet address of the node.
    #[must_use]
    pub fn backnet(&self) -> &str {
        &self.backnet
    }

    /// Frontnet address of the node.
    #[must_use]
    pub fn frontnet(&self) -> &str {
        &self.frontnet
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new()
            .arg("backnet_ip", self.backnet.as_str())
            .arg("frontnet_ip", self.frontnet.as_str())
            .arg("login", self.login.as_str())
            .secret("password", self.password.as_str());
        if let Some(hostname) = &self.hostname {
            params.insert("hostname", hostname.as_str());
        }
        params
    }
}

/// Provisioning client for one platform installation.
#[derive(Debug)]
pub struct OaApi<R = HttpRpcTransport, H = HttpRestTransport> {
    dispatcher: Dispatcher<R, H>,
    generator: TypeGenerator,
}

impl OaApi {
    /// Connects to the endpoint described by `config`.
    ///
    /// No call is made until the first operation.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Config`] when the endpoint URL or token owner is invalid.
    /// * [`ApiError::Rpc`] or [`ApiError::Rest`] when an HTTP client cannot
    ///   be built.
    pub fn connect(config: &oa_config::Config) -> Result<Self, ApiError> {
        let endpoint = config.openapi_endpoint()?;
        let (account_id, subscription_id) = config.token_owner()?;
        let rpc = HttpRpcTransport::new(endpoint, config.http_timeout())?;
        let rest = HttpRestTransport::new(config.http_timeout())?;
        debug!(
            target: OPERATIONS_TARGET,
            endpoint = %rpc.endpoint(),
            account_id,
            subscription_id,
            "connecting"
        );
        let dispatcher = Dispatcher::new(rpc, rest)
            .with_async_timeout(config.async_timeout())
            .with_token_owner(account_id, subscription_id);
        Ok(Self::with_dispatcher(dispatcher))
    }
}

impl<R, H> OaApi<R, H> {
    /// Wraps `dispatcher`, sharing the process-wide type registry.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher<R, H>) -> Self {
        Self {
            dispatcher,
            generator: TypeGenerator::shared(),
        }
    }

    /// Replaces the type generator.
    #[must_use]
    pub fn with_generator(mut self, generator: TypeGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// The underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<R, H> {
        &self.dispatcher
    }

    /// The type generator used by [`OaApi::resolve_type`].
    #[must_use]
    pub const fn generator(&self) -> &TypeGenerator {
        &self.generator
    }
}

impl<R: RpcTransport, H> OaApi<R, H> {
    /// Reports whether the installation holds an active license.
    ///
    /// # Errors
    ///
    /// Any failure other than the platform's "license not active" answer.
    pub fn has_active_license(&self) -> Result<bool, ApiError> {
        match self
            .dispatcher
            .call_sync(&pem(&["checkLicenseIsActive"]), &Params::new())
        {
            Ok(_) => Ok(true),
            Err(error) if error.is_known(KnownError::LICENSE_NOT_ACTIVE) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Uploads `license` to the platform.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`].
    pub fn upload_license(&self, license: &LicenseFile) -> Result<(), ApiError> {
        info!(
            target: OPERATIONS_TARGET,
            key_number = license.key_number(),
            "uploading license"
        );
        self.dispatcher.call_sync(
            &pem(&["uploadLicense"]),
            &Params::new().arg("license", license.content().to_vec()),
        )?;
        Ok(())
    }

    /// Removes the license with `key_number`.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`].
    pub fn remove_license(&self, key_number: &str) -> Result<(), ApiError> {
        info!(target: OPERATIONS_TARGET, key_number, "removing license");
        self.dispatcher.call_sync(
            &pem(&["removeLicense"]),
            &Params::new().arg("key_id", key_number),
        )?;
        Ok(())
    }

    /// Names of the installed modules.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`]; [`ApiError::InvalidResponse`] when the
    /// answer is not a list of names.
    pub fn installed_modules(&self) -> Result<Vec<String>, ApiError> {
        let method = pem(&["packaging", "getInstalledModules"]);
        let result = self.dispatcher.call_sync(&method, &Params::new())?;
        let entries = result
            .as_array()
            .ok_or_else(|| ApiError::invalid_response(method.as_str(), "expected a list"))?;
        entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .or_else(|| entry.get("name").and_then(Value::as_str))
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        ApiError::invalid_response(method.as_str(), "module entry without a name")
                    })
            })
            .collect()
    }

    /// Installs module `name` and waits for the installation to finish.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_async_wait`].
    pub fn install_module(&self, name: &str) -> Result<(), ApiError> {
        info!(target: OPERATIONS_TARGET, module = name, "installing module");
        self.dispatcher.call_async_wait(
            &pem(&["packaging", "installModule"]),
            &Params::new().arg("name", name),
            None,
        )?;
        Ok(())
    }

    /// Identifier of the host with address `ip`, or `None` when no host has
    /// it.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_sync`]; [`ApiError::InvalidResponse`] when the
    /// answer carries no host id.
    pub fn host_id_by_ip(&self, ip: &str) -> Result<Option<i64>, ApiError> {
        let method = pem(&["getHostByIp"]);
        match self
            .dispatcher
            .call_sync(&method, &Params::new().arg("ip_address", ip))
        {
            Ok(result) => host_id(&method, &result).map(Some),
            Err(error) if error.is_known(KnownError::HOST_NOT_FOUND) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Reports whether a host with address `ip` is registered.
    ///
    /// # Errors
    ///
    /// See [`OaApi::host_id_by_ip`].
    pub fn is_node_registered(&self, ip: &str) -> Result<bool, ApiError> {
        Ok(self.host_id_by_ip(ip)?.is_some())
    }

    /// Registers a name server and returns its new host id.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_async_wait`]; [`ApiError::InvalidResponse`]
    /// when the answer carries no host id.
    pub fn register_name_server(
        &self,
        registration: &NameServerRegistration,
    ) -> Result<i64, ApiError> {
        let method = pem(&["dns", "registerNameServer"]);
        info!(
            target: OPERATIONS_TARGET,
            backnet = registration.backnet(),
            frontnet = registration.frontnet(),
            "registering name server"
        );
        let result = self
            .dispatcher
            .call_async_wait(&method, &registration.to_params(), None)?;
        host_id(&method, &result)
    }
}

impl<R: RpcTransport, H: RestTransport> OaApi<R, H> {
    /// Key number of the active license, or `None` without one.
    ///
    /// # Errors
    ///
    /// The errors of [`OaApi::has_active_license`] and
    /// [`Dispatcher::call_rest`]; [`ApiError::InvalidResponse`] when no
    /// license resource carries a key number.
    pub fn license_number(&self) -> Result<Option<String>, ApiError> {
        if !self.has_active_license()? {
            return Ok(None);
        }
        let request = RestRequest::get(RestPath::aps().join("resources"))
            .query(format!("implementing({PRODUCT_LICENSE_TYPE})"));
        let resources = self.dispatcher.call_rest(&request)?;
        resources
            .get(0)
            .and_then(|resource| resource.get("keyNumber"))
            .and_then(Json::as_str)
            .map(|key| Some(key.to_owned()))
            .ok_or_else(|| {
                ApiError::invalid_response(request.path().as_str(), "no license key number")
            })
    }

    /// Fetches the APS schema of `type_id`.
    ///
    /// For a compound `parent#Structure` id the parent's schema is fetched
    /// and the named structure returned, with its `name` and `id` set to
    /// `Structure` and the compound id.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::call_rest`].
    pub fn type_schema(&self, type_id: &str) -> Result<Option<Json>, ApiError> {
        let (parent, structure) = type_id
            .split_once('#')
            .map_or((type_id, None), |(parent, name)| (parent, Some(name)));
        let request =
            RestRequest::get(RestPath::aps().join("types")).query(format!("id={parent}"));
        let answer = self.dispatcher.call_rest(&request)?;
        let Some(schema) = answer.get(0).filter(|schema| schema.is_object()) else {
            debug!(target: OPERATIONS_TARGET, type_id, "type not found");
            return Ok(None);
        };
        let Some(structure_name) = structure else {
            return Ok(Some(schema.clone()));
        };

        let Some(Json::Object(members)) = schema
            .get("structures")
            .and_then(|structures| structures.get(structure_name))
        else {
            debug!(target: OPERATIONS_TARGET, type_id, "structure not found");
            return Ok(None);
        };
        let mut nested = members.clone();
        nested.insert("name".to_owned(), Json::from(structure_name));
        nested.insert("id".to_owned(), Json::from(type_id));
        Ok(Some(Json::Object(nested)))
    }

    /// Builds the descriptor of APS type `type_id`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Schema`] when the type cannot be fetched or generated.
    pub fn resolve_type(&self, type_id: &str) -> Result<Arc<TypeDescriptor>, ApiError> {
        Ok(self.generator.resolve_type(type_id, self)?)
    }
}

impl<R: RpcTransport, H: RestTransport> SchemaSource for OaApi<R, H> {
    fn fetch_schema(&self, type_id: &str) -> Result<Option<Json>, SchemaError> {
        self.type_schema(type_id).map_err(|error| SchemaError::Fetch {
            type_id: type_id.to_owned(),
            message: error.to_string(),
        })
    }
}

fn host_id(method: &MethodName, result: &Value) -> Result<i64, ApiError> {
    result
        .as_i64()
        .or_else(|| result.get("host_id").and_then(Value::as_i64))
        .ok_or_else(|| ApiError::invalid_response(method.as_str(), "missing host_id"))
}
