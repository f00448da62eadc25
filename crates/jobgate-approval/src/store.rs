//! Backing store and queue interfaces.
//!
//! These are the collaborators the approval core consumes. Implementations
//! must make every single call atomic; the core adds no locking of its own.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApprovalResult;

/// Hash-valued key-value store holding the pending registry.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Set `field` in `bucket` (last write wins).
    async fn hash_set(&self, bucket: &str, field: &str, value: &str) -> ApprovalResult<()>;

    /// Get `field` from `bucket`.
    async fn hash_get(&self, bucket: &str, field: &str) -> ApprovalResult<Option<String>>;

    /// Delete `field`; returns whether it existed.
    async fn hash_delete(&self, bucket: &str, field: &str) -> ApprovalResult<bool>;

    /// Number of fields in `bucket`.
    async fn hash_field_count(&self, bucket: &str) -> ApprovalResult<usize>;

    /// All fields of `bucket`, in no particular order.
    async fn hash_all_fields(&self, bucket: &str) -> ApprovalResult<Vec<String>>;

    /// Atomically increment `counter` and return the new value (first call returns 1).
    async fn increment(&self, counter: &str) -> ApprovalResult<u64>;
}

/// Named FIFO queues of encoded jobs.
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Append an encoded job to `queue`.
    async fn enqueue(&self, queue: &str, encoded: &str) -> ApprovalResult<()>;

    /// Number of jobs in `queue`.
    async fn queue_size(&self, queue: &str) -> ApprovalResult<usize>;

    /// Encoded job at `offset` from the head of `queue`.
    async fn peek(&self, queue: &str, offset: usize) -> ApprovalResult<Option<String>>;

    /// Remove at most one job whose encoding equals `encoded`; returns the removed count.
    async fn remove_one_matching(&self, queue: &str, encoded: &str) -> ApprovalResult<usize>;
}

/// Optional capability: delayed submission of encoded jobs.
///
/// Delayed entries are complete encodings carrying their own `queue`, which the
/// scheduler uses as the destination once the delay elapses.
#[async_trait]
pub trait DelayedScheduler: Send + Sync {
    /// Schedule an encoded job to be released after `delay`.
    async fn enqueue_delayed(&self, delay: Duration, encoded: &str) -> ApprovalResult<()>;

    /// Identifiers of all delayed buckets, earliest first.
    async fn delayed_locations(&self) -> ApprovalResult<Vec<String>>;

    /// Remove at most one matching entry from one bucket; returns the removed count.
    async fn remove_delayed_matching(&self, location: &str, encoded: &str) -> ApprovalResult<usize>;

    /// Total number of delayed entries across buckets.
    async fn delayed_count(&self) -> ApprovalResult<usize>;
}
