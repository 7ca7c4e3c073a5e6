#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use dubbo_metrics_registry::config::SdkConfig;
use dubbo_metrics_registry::Sdk;

#[test]
fn defaults_name_the_service_dubbo() {
    let sdk = Sdk::default();
    assert_eq!(sdk.config().service_name, "Dubbo");
    assert!(!sdk.is_running());
}

#[test]
fn overrides_win_over_defaults() {
    let sdk = Sdk::with_overrides(json!({ "service_name": "greeter" })).unwrap();
    assert_eq!(sdk.config().service_name, "greeter");
    assert_eq!(sdk.config().log_filter, "info");
}

#[test]
fn empty_overrides_keep_defaults() {
    let cfg = SdkConfig::default().with_overrides(json!({})).unwrap();
    assert_eq!(cfg, SdkConfig::default());
}

#[test]
fn extra_overrides_pass_through() {
    let cfg = SdkConfig::default()
        .with_overrides(json!({
            "exporter": "otlp",
            "resource": { "env": "staging" },
            "service_name": "greeter",
        }))
        .unwrap();
    assert_eq!(cfg.service_name, "greeter");
    assert_eq!(cfg.extra["exporter"], json!("otlp"));
    assert_eq!(cfg.extra["resource"], json!({ "env": "staging" }));

    // A second merge keeps earlier extras and merges nested objects.
    let cfg = cfg
        .with_overrides(json!({ "resource": { "region": "eu" } }))
        .unwrap();
    assert_eq!(cfg.extra["exporter"], json!("otlp"));
    assert_eq!(cfg.extra["resource"], json!({ "env": "staging", "region": "eu" }));
    assert_eq!(cfg.service_name, "greeter");
}

#[test]
fn malformed_overrides_are_rejected() {
    let err = SdkConfig::default()
        .with_overrides(json!({ "service_name": 42 }))
        .expect_err("wrong type");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");

    let err = SdkConfig::default()
        .with_overrides(json!("greeter"))
        .expect_err("not an object");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");

    let err = SdkConfig::default()
        .with_overrides(json!({ "service_name": "" }))
        .expect_err("empty name");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn start_and_shutdown_are_idempotent() {
    let sdk = Sdk::default();
    sdk.shutdown();
    assert!(!sdk.is_running());

    sdk.start().unwrap();
    sdk.start().unwrap();
    assert!(sdk.is_running());

    sdk.shutdown();
    sdk.shutdown();
    assert!(!sdk.is_running());
}
