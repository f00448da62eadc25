//! Job descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::ApprovalResult;

/// A unit of work as it travels through queues and the pending registry.
///
/// Encodes as `{"class":..,"args":[..]}`, plus `"queue"` when the job carries
/// its destination with it (jobs held on the delayed path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Handler the job belongs to.
    pub class: String,
    /// Ordered, opaque arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Destination queue carried with the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

impl Job {
    /// Create a job without arguments.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            args: Vec::new(),
            queue: None,
        }
    }

    /// Set the arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Append one argument.
    pub fn with_arg(mut self, arg: Value) -> Self {
        self.args.push(arg);
        self
    }

    /// Set the destination queue.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// The options argument (first argument, when it is an object).
    pub fn options(&self) -> Option<&Map<String, Value>> {
        match self.args.first() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to the options argument, if present.
    pub fn options_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self.args.first_mut() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// The options argument, inserting an empty one at the front if missing.
    pub fn ensure_options(&mut self) -> &mut Map<String, Value> {
        if self.options().is_none() {
            self.args.insert(0, Value::Object(Map::new()));
        }
        match self.args.first_mut() {
            Some(Value::Object(map)) => map,
            _ => unreachable!("options argument inserted above"),
        }
    }

    /// Canonical encoding.
    pub fn encode(&self) -> ApprovalResult<String> {
        codec::encode(self)
    }

    /// Decode a canonical encoding.
    pub fn decode(text: &str) -> ApprovalResult<Self> {
        codec::decode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_without_queue() {
        let job = Job::new("Job").with_arg(json!({}));
        assert_eq!(job.encode().unwrap(), r#"{"class":"Job","args":[{}]}"#);
    }

    #[test]
    fn test_encode_with_queue() {
        let job = Job::new("Job")
            .with_arg(json!({"approval_key": "{\"id\":0,\"approval_timeout\":10}"}))
            .with_queue("dummy");
        assert_eq!(
            job.encode().unwrap(),
            r#"{"class":"Job","args":[{"approval_key":"{\"id\":0,\"approval_timeout\":10}"}],"queue":"dummy"}"#
        );
    }

    #[test]
    fn test_decode_missing_args() {
        let job = Job::decode(r#"{"class":"Job"}"#).unwrap();
        assert!(job.args.is_empty());
        assert!(job.queue.is_none());
    }

    #[test]
    fn test_ensure_options_inserts_front() {
        let mut job = Job::new("Job").with_arg(json!(42));
        job.ensure_options().insert("a".to_string(), json!(1));
        assert_eq!(job.args, vec![json!({"a": 1}), json!(42)]);

        // Existing options are reused.
        job.ensure_options().insert("b".to_string(), json!(2));
        assert_eq!(job.args.len(), 2);
        assert_eq!(job.options().unwrap().len(), 2);
    }

    #[test]
    fn test_options_absent_for_scalar_first_arg() {
        let mut job = Job::new("Job").with_arg(json!("x"));
        assert!(job.options().is_none());
        assert!(job.options_mut().is_none());
    }
}
