//! Command-line argument definitions for `oa-provision`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use oa_api::operations::DEFAULT_NS_LOGIN;

/// Provisioning steps for a platform management node.
///
/// Every run prints one JSON object on standard output describing whether
/// anything changed.
#[derive(Parser, Debug)]
#[command(name = "oa-provision", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Exits with status 2 when the step changed something.
    #[arg(long)]
    pub(crate) detailed_exitcode: bool,
    /// The provisioning step to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Provisioning steps.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Uploads a license unless one is already active.
    License {
        /// License file to upload.
        #[arg(long, value_name = "PATH")]
        license_file: Utf8PathBuf,
    },
    /// Installs the named modules that are not installed yet.
    Modules {
        /// Module names.
        #[arg(value_name = "NAME", required = true)]
        modules: Vec<String>,
    },
    /// Registers a name server node unless its backnet address is known.
    RegisterNs(RegisterNsArgs),
    /// Installs available hotfixes with `oa-update`.
    Update,
}

impl CliCommand {
    /// The subcommand as typed on the command line.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::License { .. } => "license",
            Self::Modules { .. } => "modules",
            Self::RegisterNs(_) => "register-ns",
            Self::Update => "update",
        }
    }
}

/// Arguments of the `register-ns` step.
#[derive(Args, Debug, Clone)]
pub(crate) struct RegisterNsArgs {
    /// Backnet address of the node.
    #[arg(long, value_name = "IP")]
    pub(crate) backnet: String,
    /// Frontnet address serving DNS.
    #[arg(long, value_name = "IP")]
    pub(crate) frontnet: String,
    /// Hostname assigned on registration.
    #[arg(long, value_name = "HOSTNAME")]
    pub(crate) new_hostname: Option<String>,
    /// Login used to reach the node.
    #[arg(long, default_value = DEFAULT_NS_LOGIN)]
    pub(crate) login: String,
    /// Password for `login`.
    #[arg(long)]
    pub(crate) password: String,
}
