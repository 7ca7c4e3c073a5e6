#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use dubbo_metrics_registry::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
scope:
  nmae: "dubbo-js" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let err = config::load_from_str("version: 1\nexporter: otlp\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn extra_sdk_options_pass_through() {
    let ok = r#"
version: 1
sdk:
  service_name: "greeter"
  exporter: "otlp"
  resource:
    env: "staging"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.sdk.service_name, "greeter");
    assert_eq!(cfg.sdk.log_filter, "info");
    assert_eq!(cfg.sdk.extra["exporter"], serde_json::json!("otlp"));
    assert_eq!(cfg.sdk.extra["resource"]["env"], serde_json::json!("staging"));
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.scope.name, "dubbo-js");
    assert_eq!(cfg.scope.version, "0.0.1");
    assert_eq!(cfg.sdk.service_name, "Dubbo");
    assert_eq!(cfg.sdk.log_filter, "info");
}

#[test]
fn explicit_values_win() {
    let ok = r#"
version: 1
scope:
  name: "greeter"
  version: "2.1.0"
sdk:
  service_name: "greeter-svc"
  log_filter: "dubbo_metrics_registry=debug,warn"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let scope = cfg.scope.to_scope();
    assert_eq!(scope.name, "greeter");
    assert_eq!(scope.version, "2.1.0");
    assert_eq!(cfg.sdk.service_name, "greeter-svc");
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn empty_scope_name_is_rejected() {
    let bad = r#"
version: 1
scope:
  name: "  "
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn missing_file_is_bad_config() {
    let err = config::load_from_file("/nonexistent/dubbo-metrics.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
