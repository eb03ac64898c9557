//! Integration tests for the `oa-provision` binary entry point.
//!
//! Verifies help output, argument validation and the JSON failure report
//! when the platform cannot be reached.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

#[test]
fn help_lists_the_steps() {
    let mut command = cargo_bin_cmd!("oa-provision");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("register-ns"))
        .stdout(contains("update"));
}

#[test]
fn missing_step_exits_with_failure() {
    let mut command = cargo_bin_cmd!("oa-provision");
    command
        .assert()
        .failure()
        .stdout(contains(r#""failed":true"#));
}

#[test]
fn name_server_registration_requires_a_password() {
    let mut command = cargo_bin_cmd!("oa-provision");
    command.args(["register-ns", "--backnet", "10.0.0.5", "--frontnet", "203.0.113.5"]);
    command
        .assert()
        .failure()
        .stderr(contains("required"))
        .stderr(contains("--password"));
}

#[test]
fn unreachable_platform_is_reported_as_json() {
    let workdir = TempDir::new().expect("temp dir");
    let mut command = cargo_bin_cmd!("oa-provision");
    command.current_dir(workdir.path()).args([
        "--openapi-url",
        "http://127.0.0.1:9/RPC2",
        "--http-timeout-secs",
        "2",
        "license",
        "--license-file",
        "/nonexistent/license.xml",
    ]);
    command
        .assert()
        .failure()
        .stdout(contains(r#""failed":true"#))
        .stdout(contains("Failed with"));
}
