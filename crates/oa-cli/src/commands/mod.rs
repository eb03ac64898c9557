//! Provisioning steps executed against the platform.
//!
//! Each step is idempotent: it inspects the current state first and only
//! changes what is missing.

use camino::Utf8Path;
use tracing::info;

use oa_api::{ApiError, LicenseFile, NameServerRegistration, OaApi, RestTransport, RpcTransport};

use crate::cli::{CliCommand, RegisterNsArgs};
use crate::errors::AppError;
use crate::outcome::Outcome;
use crate::update::{CommandRunner, apply_hotfixes};

const COMMAND_TARGET: &str = "oa_cli::commands";

/// Runs `command`, connecting to the platform only for steps that need it.
pub(crate) fn execute<R, H, C>(
    command: &CliCommand,
    connect: C,
    runner: &impl CommandRunner,
) -> Result<Outcome, AppError>
where
    R: RpcTransport,
    H: RestTransport,
    C: FnOnce() -> Result<OaApi<R, H>, ApiError>,
{
    match command {
        CliCommand::License { license_file } => ensure_license(&connect()?, license_file),
        CliCommand::Modules { modules } => ensure_modules(&connect()?, modules),
        CliCommand::RegisterNs(args) => ensure_name_server(&connect()?, args),
        CliCommand::Update => Ok(apply_hotfixes(runner)?),
    }
}

/// Uploads the license file unless a license is already active.
pub(crate) fn ensure_license<R, H>(
    api: &OaApi<R, H>,
    license_file: &Utf8Path,
) -> Result<Outcome, AppError>
where
    R: RpcTransport,
{
    if api.has_active_license()? {
        info!(target: COMMAND_TARGET, "license already active");
        return Ok(Outcome::unchanged());
    }
    let license = LicenseFile::load(license_file)?;
    api.upload_license(&license)?;
    Ok(Outcome::changed())
}

/// Installs the modules from `wanted` that are not installed, in order.
pub(crate) fn ensure_modules<R, H>(
    api: &OaApi<R, H>,
    wanted: &[String],
) -> Result<Outcome, AppError>
where
    R: RpcTransport,
{
    let installed = api.installed_modules()?;
    let mut missing: Vec<String> = Vec::new();
    for module in wanted {
        if !installed.contains(module) && !missing.contains(module) {
            missing.push(module.clone());
        }
    }
    if missing.is_empty() {
        info!(target: COMMAND_TARGET, "all modules installed");
        return Ok(Outcome::unchanged());
    }

    for module in &missing {
        api.install_module(module)?;
    }
    Ok(Outcome::changed().with("installed_modules", missing))
}

/// Registers the name server unless its backnet address is a known host.
pub(crate) fn ensure_name_server<R, H>(
    api: &OaApi<R, H>,
    args: &RegisterNsArgs,
) -> Result<Outcome, AppError>
where
    R: RpcTransport,
{
    if api.is_node_registered(&args.backnet)? {
        info!(target: COMMAND_TARGET, backnet = %args.backnet, "node already registered");
        return Ok(Outcome::unchanged());
    }

    let mut registration = NameServerRegistration::new(
        args.backnet.as_str(),
        args.frontnet.as_str(),
        args.password.as_str(),
    )
    .login(args.login.as_str());
    if let Some(hostname) = &args.new_hostname {
        registration = registration.hostname(hostname.as_str());
    }
    let host_id = api.register_name_server(&registration)?;
    Ok(Outcome::changed().with("host_id", host_id))
}
