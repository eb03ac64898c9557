//! Hotfix installation through the platform's `oa-update` tool.

use std::io;
use std::process::Command;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::outcome::Outcome;

const UPDATE_TARGET: &str = "oa_cli::update";

/// Program that lists and installs hotfixes.
pub(crate) const UPDATE_PROGRAM: &str = "oa-update";

const AVAILABLE_MARKER: &str = "Available hotfix";

#[expect(clippy::expect_used, reason = "the pattern is a literal")]
static HOTFIX_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*\]  \* (KB.*)$").expect("valid hotfix pattern"));

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub(crate) enum HotfixError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        source: Arc<io::Error>,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Runs external programs and returns their standard output.
pub(crate) trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, HotfixError>;
}

/// Runs programs as child processes.
pub(crate) struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, HotfixError> {
        let command = render(program, args);
        debug!(target: UPDATE_TARGET, %command, "running");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| HotfixError::Spawn {
                command: command.clone(),
                source: Arc::new(source),
            })?;
        if !output.status.success() {
            return Err(HotfixError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn render(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hotfix identifiers listed in an `oa-update --batch` report.
pub(crate) fn available_hotfixes(report: &str) -> Vec<String> {
    report
        .lines()
        .filter(|line| line.contains("* KB"))
        .filter_map(|line| HOTFIX_LINE.captures(line))
        .filter_map(|captures| captures.get(1))
        .map(|kb| kb.as_str().to_owned())
        .collect()
}

/// Installs pending hotfixes.
///
/// Unchanged when the report lists none; otherwise runs the installation
/// and reports the hotfix identifiers.
pub(crate) fn apply_hotfixes(runner: &impl CommandRunner) -> Result<Outcome, HotfixError> {
    let report = runner.run(UPDATE_PROGRAM, &["--batch"])?;
    if !report.lines().any(|line| line.contains(AVAILABLE_MARKER)) {
        debug!(target: UPDATE_TARGET, "no hotfixes available");
        return Ok(Outcome::unchanged().with("hotfixes", Vec::<String>::new()));
    }

    let hotfixes = available_hotfixes(&report);
    info!(target: UPDATE_TARGET, count = hotfixes.len(), "installing hotfixes");
    runner.run(UPDATE_PROGRAM, &["--batch", "--install"])?;
    Ok(Outcome::changed().with("hotfixes", hotfixes))
}
