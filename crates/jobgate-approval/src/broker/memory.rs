//! In-memory broker.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{release_at, BrokerState};
use crate::error::ApprovalResult;
use crate::store::{DelayedScheduler, HashStore, QueueAdapter};

/// In-memory broker for testing and single-process use.
pub struct MemoryBroker {
    state: RwLock<BrokerState>,
}

impl MemoryBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BrokerState::default()),
        }
    }

    /// Release delayed jobs due at or before `now`.
    pub async fn promote_due(&self, now: DateTime<Utc>) -> ApprovalResult<usize> {
        Ok(self.state.write().await.promote_due(now.timestamp()))
    }

    /// Encoded jobs currently in `queue`, head first.
    pub async fn queue_contents(&self, queue: &str) -> Vec<String> {
        self.state.read().await.queue_contents(queue)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashStore for MemoryBroker {
    async fn hash_set(&self, bucket: &str, field: &str, value: &str) -> ApprovalResult<()> {
        self.state.write().await.hash_set(bucket, field, value);
        Ok(())
    }

    async fn hash_get(&self, bucket: &str, field: &str) -> ApprovalResult<Option<String>> {
        Ok(self.state.read().await.hash_get(bucket, field))
    }

    async fn hash_delete(&self, bucket: &str, field: &str) -> ApprovalResult<bool> {
        Ok(self.state.write().await.hash_delete(bucket, field))
    }

    async fn hash_field_count(&self, bucket: &str) -> ApprovalResult<usize> {
        Ok(self.state.read().await.hash_field_count(bucket))
    }

    async fn hash_all_fields(&self, bucket: &str) -> ApprovalResult<Vec<String>> {
        Ok(self.state.read().await.hash_all_fields(bucket))
    }

    async fn increment(&self, counter: &str) -> ApprovalResult<u64> {
        Ok(self.state.write().await.increment(counter))
    }
}

#[async_trait]
impl QueueAdapter for MemoryBroker {
    async fn enqueue(&self, queue: &str, encoded: &str) -> ApprovalResult<()> {
        self.state.write().await.enqueue(queue, encoded);
        Ok(())
    }

    async fn queue_size(&self, queue: &str) -> ApprovalResult<usize> {
        Ok(self.state.read().await.queue_size(queue))
    }

    async fn peek(&self, queue: &str, offset: usize) -> ApprovalResult<Option<String>> {
        Ok(self.state.read().await.peek(queue, offset))
    }

    async fn remove_one_matching(&self, queue: &str, encoded: &str) -> ApprovalResult<usize> {
        Ok(self.state.write().await.remove_one_matching(queue, encoded))
    }
}

#[async_trait]
impl DelayedScheduler for MemoryBroker {
    async fn enqueue_delayed(&self, delay: Duration, encoded: &str) -> ApprovalResult<()> {
        let at = release_at(Utc::now().timestamp(), delay)?;
        self.state.write().await.schedule(at, encoded);
        Ok(())
    }

    async fn delayed_locations(&self) -> ApprovalResult<Vec<String>> {
        Ok(self.state.read().await.delayed_locations())
    }

    async fn remove_delayed_matching(&self, location: &str, encoded: &str) -> ApprovalResult<usize> {
        Ok(self.state.write().await.remove_delayed_matching(location, encoded))
    }

    async fn delayed_count(&self) -> ApprovalResult<usize> {
        Ok(self.state.read().await.delayed_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_starts_at_one() {
        let broker = MemoryBroker::new();
        assert_eq!(broker.increment("c").await.unwrap(), 1);
        assert_eq!(broker.increment("c").await.unwrap(), 2);
        assert_eq!(broker.increment("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_operations() {
        let broker = MemoryBroker::new();
        broker.enqueue("q", "a").await.unwrap();
        broker.enqueue("q", "b").await.unwrap();

        assert_eq!(broker.queue_size("q").await.unwrap(), 2);
        assert_eq!(broker.peek("q", 1).await.unwrap().as_deref(), Some("b"));
        assert_eq!(broker.peek("q", 2).await.unwrap(), None);
        assert_eq!(broker.remove_one_matching("q", "a").await.unwrap(), 1);
        assert_eq!(broker.queue_contents("q").await, vec!["b"]);
    }

    #[tokio::test]
    async fn test_delayed_release() {
        let broker = MemoryBroker::new();
        broker
            .enqueue_delayed(
                Duration::from_secs(10),
                r#"{"class":"Job","args":[],"queue":"dummy"}"#,
            )
            .await
            .unwrap();
        assert_eq!(broker.delayed_count().await.unwrap(), 1);

        assert_eq!(broker.promote_due(Utc::now()).await.unwrap(), 0);
        let later = Utc::now() + chrono::Duration::seconds(11);
        assert_eq!(broker.promote_due(later).await.unwrap(), 1);
        assert_eq!(broker.queue_size("dummy").await.unwrap(), 1);
        assert_eq!(broker.delayed_count().await.unwrap(), 0);
    }
}
