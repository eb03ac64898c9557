//! Entry point for the `oa-provision` binary.
//!
//! Delegates to [`oa_cli::run`], which loads configuration, executes the
//! requested provisioning step and prints its JSON result.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    oa_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
