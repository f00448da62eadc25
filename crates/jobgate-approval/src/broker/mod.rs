//! Broker implementations of the store and queue interfaces.
//!
//! Both brokers share [`BrokerState`]: hashes, counters, FIFO queues and
//! delayed buckets keyed by release timestamp (unix seconds). Delayed buckets
//! are addressed as `delayed:<timestamp>`.

mod file;
mod memory;

pub use file::FileBroker;
pub use memory::MemoryBroker;

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApprovalError, ApprovalResult};
use crate::job::Job;

const DELAYED_PREFIX: &str = "delayed:";

/// Release timestamp for a job scheduled `delay` after `now` (unix seconds).
pub(crate) fn release_at(now: i64, delay: Duration) -> ApprovalResult<i64> {
    i64::try_from(delay.as_secs())
        .ok()
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| ApprovalError::InvalidOption {
            field: "delay".to_string(),
            message: format!("{}s is beyond the schedulable range", delay.as_secs()),
        })
}

/// Broker contents, serializable as a single snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct BrokerState {
    #[serde(default)]
    hashes: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    counters: BTreeMap<String, u64>,
    #[serde(default)]
    queues: BTreeMap<String, VecDeque<String>>,
    #[serde(default)]
    delayed: BTreeMap<i64, Vec<String>>,
}

impl BrokerState {
    pub(crate) fn hash_set(&mut self, bucket: &str, field: &str, value: &str) {
        self.hashes
            .entry(bucket.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    pub(crate) fn hash_get(&self, bucket: &str, field: &str) -> Option<String> {
        self.hashes.get(bucket).and_then(|h| h.get(field)).cloned()
    }

    pub(crate) fn hash_delete(&mut self, bucket: &str, field: &str) -> bool {
        let Some(hash) = self.hashes.get_mut(bucket) else {
            return false;
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            self.hashes.remove(bucket);
        }
        removed
    }

    pub(crate) fn hash_field_count(&self, bucket: &str) -> usize {
        self.hashes.get(bucket).map_or(0, |h| h.len())
    }

    pub(crate) fn hash_all_fields(&self, bucket: &str) -> Vec<String> {
        self.hashes
            .get(bucket)
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn increment(&mut self, counter: &str) -> u64 {
        let value = self.counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        *value
    }

    pub(crate) fn enqueue(&mut self, queue: &str, encoded: &str) {
        self.queues
            .entry(queue.to_string())
            .or_default()
            .push_back(encoded.to_string());
    }

    pub(crate) fn queue_size(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, |q| q.len())
    }

    pub(crate) fn peek(&self, queue: &str, offset: usize) -> Option<String> {
        self.queues.get(queue).and_then(|q| q.get(offset)).cloned()
    }

    pub(crate) fn queue_contents(&self, queue: &str) -> Vec<String> {
        self.queues
            .get(queue)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn remove_one_matching(&mut self, queue: &str, encoded: &str) -> usize {
        let Some(entries) = self.queues.get_mut(queue) else {
            return 0;
        };
        match entries.iter().position(|e| e == encoded) {
            Some(index) => {
                entries.remove(index);
                1
            }
            None => 0,
        }
    }

    pub(crate) fn schedule(&mut self, at: i64, encoded: &str) {
        self.delayed.entry(at).or_default().push(encoded.to_string());
    }

    pub(crate) fn delayed_locations(&self) -> Vec<String> {
        self.delayed
            .keys()
            .map(|at| format!("{}{}", DELAYED_PREFIX, at))
            .collect()
    }

    pub(crate) fn remove_delayed_matching(&mut self, location: &str, encoded: &str) -> usize {
        let Some(at) = location
            .strip_prefix(DELAYED_PREFIX)
            .and_then(|ts| ts.parse::<i64>().ok())
        else {
            return 0;
        };
        let Some(entries) = self.delayed.get_mut(&at) else {
            return 0;
        };
        let Some(index) = entries.iter().position(|e| e == encoded) else {
            return 0;
        };
        entries.remove(index);
        if entries.is_empty() {
            self.delayed.remove(&at);
        }
        1
    }

    pub(crate) fn delayed_count(&self) -> usize {
        self.delayed.values().map(Vec::len).sum()
    }

    /// Move every delayed entry due at or before `now` to its destination queue.
    ///
    /// Entries that do not decode or carry no `queue` stay scheduled.
    pub(crate) fn promote_due(&mut self, now: i64) -> usize {
        let later = self.delayed.split_off(&now.saturating_add(1));
        let due = std::mem::replace(&mut self.delayed, later);

        let mut promoted = 0;
        for (at, entries) in due {
            for encoded in entries {
                match release_target(&encoded) {
                    Some((queue, payload)) => {
                        debug!("Releasing delayed job to '{}'", queue);
                        self.enqueue(&queue, &payload);
                        promoted += 1;
                    }
                    None => {
                        warn!("Delayed entry has no destination, keeping it: {}", encoded);
                        self.schedule(at, &encoded);
                    }
                }
            }
        }
        promoted
    }
}

/// Destination queue and queue payload (`queue` field stripped) of a delayed entry.
fn release_target(encoded: &str) -> Option<(String, String)> {
    let mut job = Job::decode(encoded).ok()?;
    let queue = job.queue.take()?;
    let payload = job.encode().ok()?;
    Some((queue, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_at_adds_delay() {
        assert_eq!(release_at(1_000, Duration::from_secs(30)).unwrap(), 1_030);
        assert_eq!(release_at(1_000, Duration::ZERO).unwrap(), 1_000);
    }

    #[test]
    fn test_release_at_rejects_overflow() {
        let delay = Duration::from_secs(i64::MAX as u64);
        assert!(matches!(
            release_at(1_000, delay),
            Err(ApprovalError::InvalidOption { .. })
        ));
        assert!(release_at(0, Duration::from_secs(u64::MAX)).is_err());
    }

    #[test]
    fn test_hash_delete_drops_empty_bucket() {
        let mut state = BrokerState::default();
        state.hash_set("pending_jobs", "a", "1");
        assert!(state.hash_delete("pending_jobs", "a"));
        assert!(!state.hash_delete("pending_jobs", "a"));
        assert!(state.hashes.is_empty());
    }

    #[test]
    fn test_remove_one_matching_removes_single_duplicate() {
        let mut state = BrokerState::default();
        state.enqueue("q", "x");
        state.enqueue("q", "y");
        state.enqueue("q", "x");

        assert_eq!(state.remove_one_matching("q", "x"), 1);
        assert_eq!(state.queue_contents("q"), vec!["y", "x"]);
        assert_eq!(state.remove_one_matching("q", "z"), 0);
        assert_eq!(state.remove_one_matching("missing", "x"), 0);
    }

    #[test]
    fn test_delayed_locations_ordered() {
        let mut state = BrokerState::default();
        state.schedule(300, "c");
        state.schedule(100, "a");
        state.schedule(200, "b");
        assert_eq!(
            state.delayed_locations(),
            vec!["delayed:100", "delayed:200", "delayed:300"]
        );
        assert_eq!(state.delayed_count(), 3);
    }

    #[test]
    fn test_remove_delayed_matching() {
        let mut state = BrokerState::default();
        state.schedule(100, "a");
        assert_eq!(state.remove_delayed_matching("delayed:100", "b"), 0);
        assert_eq!(state.remove_delayed_matching("bogus", "a"), 0);
        assert_eq!(state.remove_delayed_matching("delayed:100", "a"), 1);
        assert!(state.delayed_locations().is_empty());
    }

    #[test]
    fn test_promote_due() {
        let mut state = BrokerState::default();
        state.schedule(100, r#"{"class":"Job","args":[{}],"queue":"dummy"}"#);
        state.schedule(500, r#"{"class":"Job","args":[],"queue":"dummy"}"#);
        state.schedule(100, r#"{"class":"Job","args":[]}"#);

        assert_eq!(state.promote_due(200), 1);
        assert_eq!(
            state.queue_contents("dummy"),
            vec![r#"{"class":"Job","args":[{}]}"#]
        );
        // The entry without a destination stays where it was.
        assert_eq!(state.delayed_locations(), vec!["delayed:100", "delayed:500"]);
    }
}
