//! File system backed broker.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{release_at, BrokerState};
use crate::error::{ApprovalError, ApprovalResult};
use crate::store::{DelayedScheduler, HashStore, QueueAdapter};

const STATE_FILE: &str = "state.json";

/// Broker persisted as a single JSON snapshot.
///
/// ```text
/// {storage_path}/
/// └── state.json
/// ```
///
/// Every mutation is applied to a copy of the state, written to
/// `state.json.tmp` and renamed over `state.json`; the in-memory state only
/// advances once the write succeeded.
pub struct FileBroker {
    path: PathBuf,
    state: Mutex<BrokerState>,
}

impl FileBroker {
    /// Open (or create) a broker under `storage_path`.
    pub async fn open(storage_path: impl Into<PathBuf>) -> ApprovalResult<Self> {
        let storage_path = storage_path.into();
        fs::create_dir_all(&storage_path).await.map_err(|e| {
            ApprovalError::StorageUnavailable(format!(
                "Failed to create {:?}: {}",
                storage_path, e
            ))
        })?;

        let path = storage_path.join(STATE_FILE);
        let state = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content).map_err(|e| {
                ApprovalError::MalformedEncoding(format!("Corrupt broker state {:?}: {}", path, e))
            })?
        } else {
            BrokerState::default()
        };

        debug!("FileBroker opened at {:?}", path);

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release delayed jobs due at or before `now`.
    pub async fn promote_due(&self, now: DateTime<Utc>) -> ApprovalResult<usize> {
        self.mutate(|state| state.promote_due(now.timestamp())).await
    }

    /// Encoded jobs currently in `queue`, head first.
    pub async fn queue_contents(&self, queue: &str) -> Vec<String> {
        self.state.lock().await.queue_contents(queue)
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut BrokerState) -> T) -> ApprovalResult<T> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let out = f(&mut next);
        self.persist(&next).await?;
        *state = next;
        Ok(out)
    }

    async fn persist(&self, state: &BrokerState) -> ApprovalResult<()> {
        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, content).await.map_err(|e| {
            ApprovalError::StorageUnavailable(format!("Failed to write {:?}: {}", tmp, e))
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            ApprovalError::StorageUnavailable(format!("Failed to replace {:?}: {}", self.path, e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl HashStore for FileBroker {
    async fn hash_set(&self, bucket: &str, field: &str, value: &str) -> ApprovalResult<()> {
        self.mutate(|s| s.hash_set(bucket, field, value)).await
    }

    async fn hash_get(&self, bucket: &str, field: &str) -> ApprovalResult<Option<String>> {
        Ok(self.state.lock().await.hash_get(bucket, field))
    }

    async fn hash_delete(&self, bucket: &str, field: &str) -> ApprovalResult<bool> {
        self.mutate(|s| s.hash_delete(bucket, field)).await
    }

    async fn hash_field_count(&self, bucket: &str) -> ApprovalResult<usize> {
        Ok(self.state.lock().await.hash_field_count(bucket))
    }

    async fn hash_all_fields(&self, bucket: &str) -> ApprovalResult<Vec<String>> {
        Ok(self.state.lock().await.hash_all_fields(bucket))
    }

    async fn increment(&self, counter: &str) -> ApprovalResult<u64> {
        self.mutate(|s| s.increment(counter)).await
    }
}

#[async_trait]
impl QueueAdapter for FileBroker {
    async fn enqueue(&self, queue: &str, encoded: &str) -> ApprovalResult<()> {
        self.mutate(|s| s.enqueue(queue, encoded)).await
    }

    async fn queue_size(&self, queue: &str) -> ApprovalResult<usize> {
        Ok(self.state.lock().await.queue_size(queue))
    }

    async fn peek(&self, queue: &str, offset: usize) -> ApprovalResult<Option<String>> {
        Ok(self.state.lock().await.peek(queue, offset))
    }

    async fn remove_one_matching(&self, queue: &str, encoded: &str) -> ApprovalResult<usize> {
        self.mutate(|s| s.remove_one_matching(queue, encoded)).await
    }
}

#[async_trait]
impl DelayedScheduler for FileBroker {
    async fn enqueue_delayed(&self, delay: Duration, encoded: &str) -> ApprovalResult<()> {
        let at = release_at(Utc::now().timestamp(), delay)?;
        self.mutate(|s| s.schedule(at, encoded)).await
    }

    async fn delayed_locations(&self) -> ApprovalResult<Vec<String>> {
        Ok(self.state.lock().await.delayed_locations())
    }

    async fn remove_delayed_matching(&self, location: &str, encoded: &str) -> ApprovalResult<usize> {
        self.mutate(|s| s.remove_delayed_matching(location, encoded)).await
    }

    async fn delayed_count(&self) -> ApprovalResult<usize> {
        Ok(self.state.lock().await.delayed_count())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
