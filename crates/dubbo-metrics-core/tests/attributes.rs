#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use dubbo_metrics_core::attributes::{attrs, label_pairs, AttrValue, EMPTY};

#[test]
fn label_pairs_are_sorted_and_stringified() {
    let a = attrs([
        ("service", AttrValue::from("org.demo.Greeter")),
        ("method", AttrValue::from("sayHello")),
        ("retry", AttrValue::from(2_i64)),
        ("oneway", AttrValue::from(false)),
    ]);
    assert_eq!(
        label_pairs(&a),
        vec![
            ("method".to_string(), "sayHello".to_string()),
            ("oneway".to_string(), "false".to_string()),
            ("retry".to_string(), "2".to_string()),
            ("service".to_string(), "org.demo.Greeter".to_string()),
        ]
    );
    assert!(label_pairs(&EMPTY).is_empty());
}

#[test]
fn values_deserialize_untagged() {
    let a: dubbo_metrics_core::Attributes =
        serde_json::from_str(r#"{"ok":true,"n":3,"ratio":0.5,"side":"provider"}"#).unwrap();
    assert_eq!(a["ok"], AttrValue::Bool(true));
    assert_eq!(a["n"], AttrValue::Int(3));
    assert_eq!(a["ratio"], AttrValue::Float(0.5));
    assert_eq!(a["side"], AttrValue::Str("provider".into()));
}
