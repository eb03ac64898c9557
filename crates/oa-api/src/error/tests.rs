//! Unit tests for error classification and rendering.

use std::collections::BTreeMap;
use std::error::Error as _;

use rstest::rstest;

use super::*;

fn envelope(module: Option<&str>, code: Option<i64>, message: Option<&str>) -> Value {
    let mut members = BTreeMap::from([("status".to_owned(), Value::Int(-1))]);
    if let Some(module_id) = module {
        members.insert("module_id".to_owned(), Value::from(module_id));
    }
    if let Some(extype_id) = code {
        members.insert("extype_id".to_owned(), Value::Int(extype_id));
    }
    if let Some(text) = message {
        members.insert("error_message".to_owned(), Value::from(text));
    }
    Value::Struct(members)
}

#[rstest]
fn envelope_fields_are_carried() {
    let error = RemoteCallError::from_envelope(
        "pem.checkLicenseIsActive",
        &envelope(Some("Licensing"), Some(1), Some("License is not active")),
    );
    assert!(error.is("Licensing", 1));
    assert_eq!(
        error.to_string(),
        "pem.checkLicenseIsActive failed (Licensing/1): License is not active"
    );
}

#[rstest]
fn missing_message_gets_a_placeholder() {
    let error = RemoteCallError::from_envelope("pem.commit", &envelope(None, None, None));
    assert_eq!(error.to_string(), "pem.commit failed: unspecified platform error");
}

#[rstest]
fn faults_keep_their_cause() {
    let fault = RpcError::Fault {
        code: 4,
        message: String::from("boom"),
    };
    let error = RemoteCallError::from_fault("pem.foo", 4, "boom", fault);
    assert!(error.is(KnownError::XMLRPC_MODULE, 4));
    assert!(error.source().is_some());
}

#[rstest]
#[case(KnownError::LICENSE_NOT_ACTIVE, "Licensing", 1, true)]
#[case(KnownError::LICENSE_NOT_ACTIVE, "Licensing", 2, false)]
#[case(KnownError::LICENSE_NOT_ACTIVE, "Hosts", 1, false)]
#[case(KnownError::HOST_NOT_FOUND, "Hosts", 1, true)]
fn known_errors_match_module_and_code(
    #[case] known: KnownError,
    #[case] module: &str,
    #[case] code: i64,
    #[case] expected: bool,
) {
    let error = ApiError::from(RemoteCallError::from_envelope(
        "pem.any",
        &envelope(Some(module), Some(code), Some("x")),
    ));
    assert_eq!(error.is_known(known), expected);
    assert!(error.is_remote_failure());
}

#[rstest]
fn transport_errors_are_not_remote() {
    let error = ApiError::from(RpcError::Status { status: 502 });
    assert!(error.remote_call().is_none());
    assert!(!error.is_known(KnownError::LICENSE_NOT_ACTIVE));
    assert!(!error.is_remote_failure());
}

#[rstest]
fn timeouts_mask_secret_arguments() {
    let error = ApiError::Timeout {
        method: String::from("pem.dns.registerNameServer"),
        args: Params::new()
            .arg("login", "root")
            .secret("password", "hunter2"),
        timeout: Duration::from_secs(120),
    };
    let rendered = error.to_string();
    assert!(error.is_timeout());
    assert!(rendered.starts_with("timeout (120s) while executing pem.dns.registerNameServer"));
    assert!(!rendered.contains("hunter2"));
}

#[rstest]
#[case(Duration::from_millis(250), "timeout (250ms)")]
#[case(Duration::from_millis(1500), "timeout (1.5s)")]
#[case(Duration::from_secs(30), "timeout (30s)")]
fn timeouts_render_sub_second_budgets(#[case] timeout: Duration, #[case] expected: &str) {
    let error = ApiError::Timeout {
        method: String::from("pem.packaging.installModule"),
        args: Params::new().arg("name", "demo"),
        timeout,
    };
    let rendered = error.to_string();
    assert!(rendered.starts_with(expected), "unexpected: {rendered}");
}

#[rstest]
fn async_failures_are_remote_failures() {
    let error = ApiError::AsyncFailed {
        method: String::from("pem.packaging.installModule"),
        args: Params::new().arg("name", "demo"),
        request_id: 9,
        status: 2,
    };
    assert!(error.is_remote_failure());
    assert!(error.remote_call().is_none());
    assert!(error.to_string().contains("status: 2"));
}

#[rstest]
fn commit_failures_expose_their_cause() {
    let cause = ApiError::from(RemoteCallError::from_envelope(
        "pem.commit",
        &envelope(Some("Requests"), Some(3), Some("no open request")),
    ));
    let error = ApiError::CommitFailed {
        method: String::from("pem.packaging.installModule"),
        request_id: 11,
        source: Box::new(cause),
    };
    assert!(error.to_string().contains("request 11"));
    let source = error.source().expect("commit failure has a cause");
    assert!(source.to_string().contains("no open request"));
}
