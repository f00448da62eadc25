//! Reserved approval arguments.
//!
//! Producers pass approval settings inside the job's options argument under
//! either a snake_case (`approval_timeout`) or camelCase (`approvalTimeout`)
//! spelling. Parsing strips every spelling and normalizes to one structure
//! before any gate logic runs.

use serde_json::{Map, Value};

use crate::error::{ApprovalError, ApprovalResult};

pub const REQUIRES_APPROVAL: &str = "requires_approval";
pub const APPROVAL_MESSAGE: &str = "approval_message";
pub const APPROVAL_TIMEOUT: &str = "approval_timeout";

/// Injected into delayed jobs so the key can be recovered from the payload.
pub const APPROVAL_KEY: &str = "approval_key";

/// Normalized approval settings of one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalOptions {
    pub requires_approval: bool,
    pub message: Option<String>,
    /// Seconds.
    pub timeout: Option<i64>,
}

impl ApprovalOptions {
    /// Strip all reserved keys from `options` and parse them.
    pub fn extract(options: &mut Map<String, Value>) -> ApprovalResult<Self> {
        let requires_approval = Self::take_requires_approval(options);
        let message = extract_value(options, APPROVAL_MESSAGE).and_then(parse_message);
        let timeout = match extract_value(options, APPROVAL_TIMEOUT) {
            Some(value) => parse_timeout(value)?,
            None => None,
        };

        Ok(Self {
            requires_approval,
            message,
            timeout,
        })
    }

    /// Strip the `requires_approval` flag and report its truthiness.
    pub fn take_requires_approval(options: &mut Map<String, Value>) -> bool {
        extract_value(options, REQUIRES_APPROVAL)
            .map(|v| is_truthy(&v))
            .unwrap_or(false)
    }
}

/// Remove `field` under every accepted spelling, preferring snake_case.
pub fn extract_value(map: &mut Map<String, Value>, field: &str) -> Option<Value> {
    let snake = map.remove(field);
    let camel = map.remove(&camel_case(field));
    snake.or(camel)
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_message(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn parse_timeout(value: Value) -> ApprovalResult<Option<i64>> {
    let invalid = |message: &str| ApprovalError::InvalidOption {
        field: APPROVAL_TIMEOUT.to_string(),
        message: message.to_string(),
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid("expected whole seconds")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid("expected whole seconds")),
        _ => Err(invalid("expected a number")),
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
