//! Crate-level integration and BDD tests.

use serde_json::json;

use crate::testing::{FakePlatform, ScriptedRest, record, token_expired, token_of};
use crate::{Dispatcher, NameServerRegistration, OaApi, TypeGenerator, Value};


#[test]
fn provisioning_run_against_a_fake_platform() {
    let platform = FakePlatform::new()
        .respond("pem.checkLicenseIsActive", Value::Nil)
        .respond(
            "pem.packaging.getInstalledModules",
            Value::Array(vec![Value::from("Billing")]),
        )
        .respond("pem.packaging.installModule", Value::Nil)
        .fail("pem.getHostByIp", "Hosts", 1, "Host not found")
        .respond(
            "pem.dns.registerNameServer",
            record([("host_id", Value::Int(9))]),
        );
    let rest = ScriptedRest::new(|request| match token_of(request) {
        Some("token-1") => Err(token_expired()),
        _ => Ok(json!([{"keyNumber": "PPAC.00000042.0001"}])),
    });
    let api = OaApi::with_dispatcher(Dispatcher::new(&platform, &rest))
        .with_generator(TypeGenerator::new());

    assert!(api.has_active_license().expect("license check"));
    assert_eq!(
        api.license_number().expect("license number").as_deref(),
        Some("PPAC.00000042.0001")
    );

    let installed = api.installed_modules().expect("modules");
    for module in ["Billing", "DNS"] {
        if !installed.iter().any(|name| name == module) {
            api.install_module(module).expect("install");
        }
    }
    assert_eq!(platform.count("pem.packaging.installModule"), 1);

    assert!(!api.is_node_registered("10.0.0.5").expect("host lookup"));
    let host = api
        .register_name_server(&NameServerRegistration::new(
            "10.0.0.5",
            "203.0.113.5",
            "s3cret",
        ))
        .expect("register");
    assert_eq!(host, 9);

    assert_eq!(platform.tokens_issued(), 2);
    assert_eq!(platform.count("pem.commit"), 2);
}
