//! Command-line runtime for the `oa-provision` binary.
//!
//! The runtime splits configuration flags from the subcommand, loads the
//! layered configuration, installs telemetry, runs one idempotent
//! provisioning step and prints its JSON result on standard output:
//! `{"changed": bool, ...}` on success or `{"failed": true, "msg": ...}` on
//! failure. The exit status is `1` for failures, `0` otherwise, or `2` for a
//! change when `--detailed-exitcode` is given.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use serde::Serialize;
use tracing::{error, info};

use oa_api::{ApiError, OaApi, RestTransport, RpcTransport};
use oa_config::Config;

mod cli;
mod commands;
mod config;
mod errors;
mod outcome;
pub mod telemetry;
mod update;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;
use outcome::{Failure, Outcome};
use update::{CommandRunner, SystemCommandRunner};

const CLI_TARGET: &str = "oa_cli";

/// Runs the CLI with the given arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let runner = CliRunner {
        loader: &OrthoConfigLoader,
        commands: &SystemCommandRunner,
    };
    runner.run(args, stdout, stderr, OaApi::connect)
}

struct CliRunner<'a, L, C> {
    loader: &'a L,
    commands: &'a C,
}

impl<L, C> CliRunner<'_, L, C>
where
    L: ConfigLoader,
    C: CommandRunner,
{
    fn run<I, W, E, R, H, F>(&self, args: I, stdout: &mut W, stderr: &mut E, connect: F) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        W: Write,
        E: Write,
        R: RpcTransport,
        H: RestTransport,
        F: FnOnce(&Config) -> Result<OaApi<R, H>, ApiError>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        match self.execute(&args, connect) {
            Ok((outcome, detailed)) => match emit(stdout, &outcome) {
                Ok(()) => outcome.exit_code(detailed),
                Err(io_error) => {
                    error!(target: CLI_TARGET, %io_error, "failed to print result");
                    ExitCode::FAILURE
                }
            },
            Err(AppError::CliUsage(usage))
                if matches!(usage.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
            {
                match write!(stdout, "{}", usage.render()) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(_) => ExitCode::FAILURE,
                }
            }
            Err(failure) => {
                error!(target: CLI_TARGET, error = %failure, "provisioning step failed");
                if let Err(io_error) = report_failure(stdout, stderr, &failure) {
                    error!(target: CLI_TARGET, %io_error, "failed to print failure");
                }
                ExitCode::FAILURE
            }
        }
    }

    fn execute<R, H, F>(&self, args: &[OsString], connect: F) -> Result<(Outcome, bool), AppError>
    where
        R: RpcTransport,
        H: RestTransport,
        F: FnOnce(&Config) -> Result<OaApi<R, H>, ApiError>,
    {
        let split = split_config_arguments(args);
        let cli = Cli::try_parse_from(&split.cli_arguments).map_err(AppError::CliUsage)?;
        let config = self.loader.load(&split.config_arguments)?;
        telemetry::initialise(&config)?;

        info!(target: CLI_TARGET, command = cli.command.name(), "running step");
        let outcome = commands::execute(&cli.command, || connect(&config), self.commands)?;
        info!(
            target: CLI_TARGET,
            command = cli.command.name(),
            changed = outcome.is_changed(),
            "step finished"
        );
        Ok((outcome, cli.detailed_exitcode))
    }
}

fn emit<W: Write>(out: &mut W, payload: &impl Serialize) -> io::Result<()> {
    serde_json::to_writer(&mut *out, payload)?;
    writeln!(out)
}

fn report_failure<W: Write, E: Write>(
    stdout: &mut W,
    stderr: &mut E,
    failure: &AppError,
) -> io::Result<()> {
    if let AppError::CliUsage(usage) = failure {
        write!(stderr, "{}", usage.render())?;
    }
    emit(stdout, &Failure::new(failure))
}

#[cfg(test)]
mod tests;
