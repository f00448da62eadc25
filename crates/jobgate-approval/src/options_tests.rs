use super::*;
use serde_json::json;

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[test]
fn test_extract_value_snake_case() {
    let mut options = map(json!({"key": 1}));
    assert_eq!(extract_value(&mut options, "key"), Some(json!(1)));
    assert!(options.is_empty());
}

#[test]
fn test_extract_value_camel_case() {
    let mut options = map(json!({"approvalTimeout": 5, "other": true}));
    assert_eq!(extract_value(&mut options, APPROVAL_TIMEOUT), Some(json!(5)));
    assert_eq!(options, map(json!({"other": true})));
}

#[test]
fn test_extract_value_both_spellings() {
    let mut options = map(json!({"approval_message": "a", "approvalMessage": "b"}));
    assert_eq!(extract_value(&mut options, APPROVAL_MESSAGE), Some(json!("a")));
    assert!(options.is_empty());
}

#[test]
fn test_camel_case() {
    assert_eq!(camel_case("requires_approval"), "requiresApproval");
    assert_eq!(camel_case("key"), "key");
}

#[test]
fn test_extract_all() {
    let mut options = map(json!({
        "requiresApproval": true,
        "approval_message": "needs review",
        "approval_timeout": 10,
        "user": "ana"
    }));
    let parsed = ApprovalOptions::extract(&mut options).unwrap();
    assert_eq!(
        parsed,
        ApprovalOptions {
            requires_approval: true,
            message: Some("needs review".to_string()),
            timeout: Some(10),
        }
    );
    assert_eq!(options, map(json!({"user": "ana"})));
}

#[test]
fn test_extract_empty() {
    let mut options = Map::new();
    assert_eq!(
        ApprovalOptions::extract(&mut options).unwrap(),
        ApprovalOptions::default()
    );
}

#[test]
fn test_truthiness() {
    for (value, expected) in [
        (json!(true), true),
        (json!(1), true),
        (json!("yes"), true),
        (json!(false), false),
        (json!(0), false),
        (json!("false"), false),
        (json!(""), false),
        (json!(null), false),
    ] {
        let mut options = map(json!({ REQUIRES_APPROVAL: value }));
        assert_eq!(ApprovalOptions::take_requires_approval(&mut options), expected);
        assert!(options.is_empty());
    }
}

#[test]
fn test_timeout_from_string() {
    let mut options = map(json!({"approval_timeout": "30"}));
    let parsed = ApprovalOptions::extract(&mut options).unwrap();
    assert_eq!(parsed.timeout, Some(30));
}

#[test]
fn test_timeout_rejects_fraction() {
    let mut options = map(json!({"approval_timeout": 1.5}));
    let result = ApprovalOptions::extract(&mut options);
    assert!(matches!(result, Err(ApprovalError::InvalidOption { .. })));
}

#[test]
fn test_non_string_message_rendered() {
    let mut options = map(json!({"approval_message": 42}));
    let parsed = ApprovalOptions::extract(&mut options).unwrap();
    assert_eq!(parsed.message.as_deref(), Some("42"));
}
