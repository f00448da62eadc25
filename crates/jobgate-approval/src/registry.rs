//! Pending registry.

use std::sync::Arc;

use tracing::debug;

use crate::error::ApprovalResult;
use crate::job::Job;
use crate::key::ApprovalKey;
use crate::store::HashStore;

/// Durable `encoded approval key -> encoded job` mapping.
///
/// Ids come from a store-side counter named `<bucket>:next_id`, so concurrent
/// holds never receive the same id and ids are not reused after deletion.
#[derive(Clone)]
pub struct PendingRegistry {
    store: Arc<dyn HashStore>,
    bucket: String,
    counter: String,
}

impl PendingRegistry {
    /// Create a registry over `bucket`.
    pub fn new(store: Arc<dyn HashStore>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let counter = format!("{}:next_id", bucket);
        Self {
            store,
            bucket,
            counter,
        }
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Number of pending entries.
    pub async fn size(&self) -> ApprovalResult<usize> {
        self.store.hash_field_count(&self.bucket).await
    }

    /// Allocate the next id (0, 1, 2, ...).
    pub async fn next_id(&self) -> ApprovalResult<u64> {
        let value = self.store.increment(&self.counter).await?;
        Ok(value.saturating_sub(1))
    }

    /// Store `job` under `key`; an existing entry is overwritten.
    pub async fn insert(&self, key: &ApprovalKey, job: &Job) -> ApprovalResult<()> {
        self.insert_raw(&key.encode()?, &job.encode()?).await
    }

    /// Store pre-encoded text.
    pub async fn insert_raw(&self, encoded_key: &str, encoded_job: &str) -> ApprovalResult<()> {
        self.store
            .hash_set(&self.bucket, encoded_key, encoded_job)
            .await?;
        debug!("Registered pending job {}", encoded_key);
        Ok(())
    }

    /// Look up the job held under `key`.
    pub async fn lookup(&self, key: &ApprovalKey) -> ApprovalResult<Option<Job>> {
        match self.lookup_raw(&key.encode()?).await? {
            Some(value) => Ok(Some(Job::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Look up encoded job text by exact encoded key.
    pub async fn lookup_raw(&self, encoded_key: &str) -> ApprovalResult<Option<String>> {
        self.store.hash_get(&self.bucket, encoded_key).await
    }

    /// Delete the entry for `key`; absent entries are not an error.
    pub async fn delete(&self, key: &ApprovalKey) -> ApprovalResult<bool> {
        self.delete_raw(&key.encode()?).await
    }

    /// Delete by exact encoded key.
    pub async fn delete_raw(&self, encoded_key: &str) -> ApprovalResult<bool> {
        let removed = self.store.hash_delete(&self.bucket, encoded_key).await?;
        if removed {
            debug!("Removed pending job {}", encoded_key);
        }
        Ok(removed)
    }

    /// All pending keys, ascending by id.
    pub async fn list_keys(&self) -> ApprovalResult<Vec<ApprovalKey>> {
        let fields = self.store.hash_all_fields(&self.bucket).await?;
        let mut keys = fields
            .iter()
            .map(|field| ApprovalKey::decode(field))
            .collect::<ApprovalResult<Vec<_>>>()?;
        keys.sort_by_key(|k| k.id);
        Ok(keys)
    }

    /// All pending entries with their jobs, ascending by id.
    pub async fn list_pending(&self) -> ApprovalResult<Vec<(ApprovalKey, Job)>> {
        let mut entries = Vec::new();
        for key in self.list_keys().await? {
            // An entry resolved between listing and lookup is skipped.
            if let Some(job) = self.lookup(&key).await? {
                entries.push((key, job));
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
