//! Approval keys.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ApprovalResult;

/// Durable identity of one pending job.
///
/// The canonical encoding (`id`, then `approval_message`, then
/// `approval_timeout`, absent fields omitted) is the registry field, so two
/// keys are the same key only when their encodings are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalKey {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_timeout: Option<i64>,
}

impl ApprovalKey {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            approval_message: None,
            approval_timeout: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.approval_message = Some(message.into());
        self
    }

    pub fn with_timeout(mut self, seconds: i64) -> Self {
        self.approval_timeout = Some(seconds);
        self
    }

    /// Delay before automatic release; only a strictly positive timeout counts.
    pub fn delay(&self) -> Option<Duration> {
        match self.approval_timeout {
            Some(seconds) if seconds > 0 => Some(Duration::from_secs(seconds as u64)),
            _ => None,
        }
    }

    pub fn encode(&self) -> ApprovalResult<String> {
        codec::encode(self)
    }

    pub fn decode(text: &str) -> ApprovalResult<Self> {
        codec::decode(text)
    }
}
