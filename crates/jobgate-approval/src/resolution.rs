//! Resolution engine: approve, reject, and timeout release.
//!
//! `resolve` deletes the registry entry before removing the job from its
//! queue or delayed bucket. Only the caller whose delete removes the entry
//! goes on to resolve it. A crash between the two steps leaves a stale queue
//! entry but can never resolve the same key twice.

use tracing::{debug, info, warn};

use crate::context::ApprovalContext;
use crate::error::ApprovalResult;
use crate::gate::remove_delayed;
use crate::job::Job;
use crate::key::ApprovalKey;
use crate::options::APPROVAL_KEY;

/// Terminal decision handling for pending jobs.
#[derive(Clone)]
pub struct ResolutionEngine {
    ctx: ApprovalContext,
}

impl ResolutionEngine {
    pub fn new(ctx: ApprovalContext) -> Self {
        Self { ctx }
    }

    /// Approve a pending job and enqueue it on its destination.
    ///
    /// Returns `false` when no pending entry matches `encoded_key`.
    pub async fn approve(&self, encoded_key: &str) -> ApprovalResult<bool> {
        let Some(mut job) = self.resolve(encoded_key).await? else {
            return Ok(false);
        };

        let queue = match job.queue.take() {
            Some(queue) => queue,
            None => self.ctx.config.destination_for(&job.class)?,
        };
        if let Some(options) = job.options_mut() {
            options.remove(APPROVAL_KEY);
        }

        self.ctx.queues.enqueue(&queue, &job.encode()?).await?;
        info!("Approved {}, {} enqueued on '{}'", encoded_key, job.class, queue);
        Ok(true)
    }

    /// Reject a pending job, discarding it.
    ///
    /// Returns `false` when no pending entry matches `encoded_key`.
    pub async fn reject(&self, encoded_key: &str) -> ApprovalResult<bool> {
        match self.resolve(encoded_key).await? {
            Some(job) => {
                info!("Rejected {}, {} discarded", encoded_key, job.class);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a pending job from the registry and from wherever it is parked.
    ///
    /// Unknown and malformed keys resolve to `None`.
    pub async fn resolve(&self, encoded_key: &str) -> ApprovalResult<Option<Job>> {
        let Some(value) = self.ctx.registry.lookup_raw(encoded_key).await? else {
            debug!("No pending job for {}", encoded_key);
            return Ok(None);
        };
        if !self.ctx.registry.delete_raw(encoded_key).await? {
            debug!("{} was resolved concurrently", encoded_key);
            return Ok(None);
        }

        let key = ApprovalKey::decode(encoded_key)?;
        let job = Job::decode(&value)?;

        // Only delayed holds store a destination with the job.
        if key.approval_timeout.is_some() && job.queue.is_some() {
            self.unschedule(encoded_key, &value).await?;
        } else {
            let removed = self
                .ctx
                .queues
                .remove_one_matching(&self.ctx.config.approval_queue, &value)
                .await?;
            if removed == 0 {
                warn!("{} was not on '{}'", encoded_key, self.ctx.config.approval_queue);
            }
        }

        Ok(Some(job))
    }

    async fn unschedule(&self, encoded_key: &str, value: &str) -> ApprovalResult<()> {
        let Some(scheduler) = &self.ctx.scheduler else {
            warn!("No delayed scheduler to withdraw {} from", encoded_key);
            return Ok(());
        };
        if !remove_delayed(scheduler.as_ref(), value).await? {
            // The timeout already released it.
            warn!("{} was no longer scheduled", encoded_key);
        }
        Ok(())
    }

    /// Worker-side hook for jobs released by an approval timeout.
    ///
    /// Strips the injected `approval_key` from the job and clears its pending
    /// entry. Returns whether an entry was cleared.
    pub async fn before_perform(&self, job: &mut Job) -> ApprovalResult<bool> {
        let Some(options) = job.options_mut() else {
            return Ok(false);
        };
        let encoded_key = match options.remove(APPROVAL_KEY) {
            Some(serde_json::Value::String(key)) => key,
            _ => return Ok(false),
        };

        let cleared = self.ctx.registry.delete_raw(&encoded_key).await?;
        if cleared {
            info!("Approval timeout elapsed for {}, {} released", encoded_key, job.class);
        }
        Ok(cleared)
    }
}

#[cfg(test)]
#[path = "resolution_tests.rs"]
mod tests;
