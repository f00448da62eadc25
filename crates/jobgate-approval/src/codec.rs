//! Canonical textual encoding.
//!
//! Registry lookups and queue removals compare encoded text byte for byte, so
//! encoding must be deterministic: compact JSON with maps kept in insertion
//! order (`serde_json` is built with `preserve_order`).

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApprovalResult;

/// Encode a value to its canonical text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> ApprovalResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode canonical text. Fails with `MalformedEncoding`.
pub fn decode<T: DeserializeOwned>(text: &str) -> ApprovalResult<T> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApprovalError;
    use serde_json::{Value, json};

    #[test]
    fn test_encode_keeps_insertion_order() {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), json!(3));
        map.insert("approval_message".to_string(), json!("ship it"));
        map.insert("approval_timeout".to_string(), json!(10));

        let text = encode(&map).unwrap();
        assert_eq!(
            text,
            r#"{"id":3,"approval_message":"ship it","approval_timeout":10}"#
        );
    }

    #[test]
    fn test_nested_value_survives_decode() {
        let value = json!({
            "class": "Report",
            "args": [{"user": "ana", "ids": [1, 2, 3], "dry_run": false}, 7]
        });
        let text = encode(&value).unwrap();
        let decoded: Value = decode(&text).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(encode(&decoded).unwrap(), text);
    }

    #[test]
    fn test_decode_malformed() {
        let result: ApprovalResult<Value> = decode("{\"id\":");
        assert!(matches!(result, Err(ApprovalError::MalformedEncoding(_))));
    }
}
