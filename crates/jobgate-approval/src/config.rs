//! Approval configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ApprovalError, ApprovalResult};

/// Approval gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Queue holding jobs that wait for a decision without a timeout.
    #[serde(default = "default_approval_queue")]
    pub approval_queue: String,

    /// Hash bucket of the pending registry.
    #[serde(default = "default_pending_bucket")]
    pub pending_bucket: String,

    /// Destination for job classes without an explicit route.
    #[serde(default = "default_queue")]
    pub default_queue: String,

    /// Job class to destination queue.
    #[serde(default)]
    pub routes: HashMap<String, String>,

    /// Whether timeouts may use the delayed scheduler.
    #[serde(default = "default_delayed_enabled")]
    pub delayed_enabled: bool,
}

fn default_approval_queue() -> String {
    "approval_required".to_string()
}

fn default_pending_bucket() -> String {
    "pending_jobs".to_string()
}

fn default_queue() -> String {
    "default".to_string()
}

fn default_delayed_enabled() -> bool {
    true
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            approval_queue: default_approval_queue(),
            pending_bucket: default_pending_bucket(),
            default_queue: default_queue(),
            routes: HashMap::new(),
            delayed_enabled: default_delayed_enabled(),
        }
    }
}

impl ApprovalConfig {
    /// Route a job class to a queue.
    pub fn with_route(mut self, class: impl Into<String>, queue: impl Into<String>) -> Self {
        self.routes.insert(class.into(), queue.into());
        self
    }

    /// The normal destination queue of a job class.
    pub fn destination_for(&self, class: &str) -> ApprovalResult<String> {
        if let Some(queue) = self.routes.get(class) {
            return Ok(queue.clone());
        }
        if self.default_queue.is_empty() {
            return Err(ApprovalError::UnknownDestination(class.to_string()));
        }
        Ok(self.default_queue.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApprovalConfig::default();
        assert_eq!(config.approval_queue, "approval_required");
        assert_eq!(config.pending_bucket, "pending_jobs");
        assert!(config.delayed_enabled);
    }

    #[test]
    fn test_destination_for_route_and_fallback() {
        let config = ApprovalConfig::default().with_route("Job", "dummy");
        assert_eq!(config.destination_for("Job").unwrap(), "dummy");
        assert_eq!(config.destination_for("Other").unwrap(), "default");
    }

    #[test]
    fn test_destination_without_default_queue() {
        let config = ApprovalConfig {
            default_queue: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.destination_for("Job"),
            Err(ApprovalError::UnknownDestination(_))
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ApprovalConfig =
            serde_json::from_str(r#"{"routes":{"Job":"dummy"},"delayed_enabled":false}"#).unwrap();
        assert_eq!(config.approval_queue, "approval_required");
        assert_eq!(config.routes.get("Job").map(String::as_str), Some("dummy"));
        assert!(!config.delayed_enabled);
    }
}
