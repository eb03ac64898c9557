//! Tests for the CLI runtime wiring.

use std::ffi::OsString;

use rstest::{fixture, rstest};
use serde_json::{Value as Json, json};

use oa_api::testing::{FakePlatform, ScriptedRest, record};
use oa_api::{Dispatcher, Value};

use super::*;
use crate::update::HotfixError;

/// Returns default configuration without reading files or the environment.
struct DefaultConfigLoader;

impl ConfigLoader for DefaultConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(Config::default())
    }
}

/// Reports the same `oa-update` output for every invocation.
struct ReportRunner(&'static str);

impl CommandRunner for ReportRunner {
    fn run(&self, _program: &str, _args: &[&str]) -> Result<String, HotfixError> {
        Ok(self.0.to_owned())
    }
}

struct Captured {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

impl Captured {
    fn json(&self) -> Json {
        serde_json::from_str(self.stdout.trim()).expect("one JSON object on stdout")
    }
}

#[fixture]
fn platform() -> FakePlatform {
    FakePlatform::new()
        .respond(
            "pem.packaging.getInstalledModules",
            Value::Array(vec![Value::from("Billing")]),
        )
        .respond("pem.packaging.installModule", Value::Nil)
        .respond("pem.getHostByIp", record([("host_id", Value::Int(3))]))
}

fn run_with(platform: &FakePlatform, runner: &ReportRunner, args: &[&str]) -> Captured {
    let rest = ScriptedRest::unreachable();
    let cli = CliRunner {
        loader: &DefaultConfigLoader,
        commands: runner,
    };
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = cli.run(
        args.iter().map(OsString::from),
        &mut stdout,
        &mut stderr,
        |_: &Config| Ok(OaApi::with_dispatcher(Dispatcher::new(platform, &rest))),
    );
    Captured {
        code,
        stdout: String::from_utf8(stdout).expect("utf-8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf-8 stderr"),
    }
}

#[rstest]
fn changes_are_printed_as_json(platform: FakePlatform) {
    let captured = run_with(
        &platform,
        &ReportRunner(""),
        &["oa-provision", "modules", "Billing", "DNS"],
    );

    assert_eq!(captured.code, ExitCode::SUCCESS);
    assert_eq!(
        captured.json(),
        json!({"changed": true, "installed_modules": ["DNS"]})
    );
    assert!(captured.stderr.is_empty());
}

#[rstest]
#[case(&["oa-provision", "--detailed-exitcode", "modules", "DNS"], ExitCode::from(2))]
#[case(&["oa-provision", "--detailed-exitcode", "modules", "Billing"], ExitCode::SUCCESS)]
#[case(&["oa-provision", "modules", "DNS"], ExitCode::SUCCESS)]
fn detailed_exit_codes_report_changes(
    platform: FakePlatform,
    #[case] args: &[&str],
    #[case] expected: ExitCode,
) {
    let captured = run_with(&platform, &ReportRunner(""), args);
    assert_eq!(captured.code, expected);
}

#[rstest]
fn registered_nodes_report_no_change(platform: FakePlatform) {
    let captured = run_with(
        &platform,
        &ReportRunner(""),
        &[
            "oa-provision",
            "register-ns",
            "--backnet",
            "10.0.0.5",
            "--frontnet",
            "203.0.113.5",
            "--password",
            "s3cret",
        ],
    );
    assert_eq!(captured.code, ExitCode::SUCCESS);
    assert_eq!(captured.json(), json!({"changed": false}));
}

#[rstest]
fn hotfix_updates_list_what_was_installed(platform: FakePlatform) {
    let report = "[2024-01-01 10:00:00]  Available hotfixes:\n\
                  [2024-01-01 10:00:00]  * KB123 Fix DNS zone sync\n";
    let captured = run_with(&platform, &ReportRunner(report), &["oa-provision", "update"]);

    assert_eq!(
        captured.json(),
        json!({"changed": true, "hotfixes": ["KB123 Fix DNS zone sync"]})
    );
    assert!(platform.calls().is_empty());
}

#[rstest]
fn step_failures_are_reported_as_json(platform: FakePlatform) {
    let failing = platform.fail("pem.packaging.installModule", "Packaging", 4, "no such module");
    let captured = run_with(&failing, &ReportRunner(""), &["oa-provision", "modules", "Nope"]);

    assert_eq!(captured.code, ExitCode::FAILURE);
    let rendered = captured.json();
    assert_eq!(rendered.get("failed"), Some(&json!(true)));
    let message = rendered
        .get("msg")
        .and_then(Json::as_str)
        .expect("message");
    assert!(message.starts_with("Failed with "), "unexpected: {message}");
    assert!(message.contains("no such module"), "unexpected: {message}");
}

#[rstest]
fn usage_errors_fail_with_a_rendered_message(platform: FakePlatform) {
    let captured = run_with(&platform, &ReportRunner(""), &["oa-provision", "register-ns"]);

    assert_eq!(captured.code, ExitCode::FAILURE);
    assert!(captured.stderr.contains("--backnet"), "stderr: {}", captured.stderr);
    assert_eq!(captured.json().get("failed"), Some(&json!(true)));
    assert!(platform.calls().is_empty());
}

#[rstest]
fn help_is_printed_on_stdout(platform: FakePlatform) {
    let captured = run_with(&platform, &ReportRunner(""), &["oa-provision", "--help"]);

    assert_eq!(captured.code, ExitCode::SUCCESS);
    assert!(captured.stdout.contains("register-ns"));
    assert!(captured.stderr.is_empty());
}
