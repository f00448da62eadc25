//! Approval gate.
//!
//! Call sites run [`ApprovalGate::before_enqueue`] right before their normal
//! enqueue and skip the enqueue when it returns `false`; the gate has then
//! placed the job on hold itself.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::ApprovalContext;
use crate::error::ApprovalResult;
use crate::job::Job;
use crate::key::ApprovalKey;
use crate::options::{APPROVAL_KEY, ApprovalOptions};
use crate::store::DelayedScheduler;

/// Outcome of [`ApprovalGate::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Enqueued on its normal destination.
    Enqueued { queue: String },
    /// Held for approval under this key.
    Held(ApprovalKey),
}

/// Where a held job was parked.
enum Parked {
    ApprovalQueue,
    Delayed,
}

/// Pre-enqueue interception point.
#[derive(Clone)]
pub struct ApprovalGate {
    ctx: ApprovalContext,
}

impl ApprovalGate {
    pub fn new(ctx: ApprovalContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ApprovalContext {
        &self.ctx
    }

    /// Strip the `requires_approval` flag and hold the job when it is set.
    ///
    /// Returns whether the caller may enqueue the job normally.
    pub async fn before_enqueue(&self, job: &mut Job) -> ApprovalResult<bool> {
        Ok(self.intercept(job).await?.is_none())
    }

    /// Run the gate and enqueue the job normally when no approval is needed.
    pub async fn submit(&self, mut job: Job) -> ApprovalResult<Submission> {
        if let Some(key) = self.intercept(&mut job).await? {
            return Ok(Submission::Held(key));
        }

        let queue = match job.queue.take() {
            Some(queue) => queue,
            None => self.ctx.config.destination_for(&job.class)?,
        };
        self.ctx.queues.enqueue(&queue, &job.encode()?).await?;
        debug!("Enqueued {} on '{}'", job.class, queue);
        Ok(Submission::Enqueued { queue })
    }

    async fn intercept(&self, job: &mut Job) -> ApprovalResult<Option<ApprovalKey>> {
        let requires_approval = job
            .options_mut()
            .map(ApprovalOptions::take_requires_approval)
            .unwrap_or(false);
        if !requires_approval {
            return Ok(None);
        }
        let key = self.hold_for_approval(job.clone()).await?;
        Ok(Some(key))
    }

    /// Park a job until it is approved, rejected or its timeout elapses.
    ///
    /// The job's options argument (inserted when missing) is stripped of the
    /// reserved approval keys. With a positive `approval_timeout` and a
    /// delayed scheduler, the job is scheduled onto its destination with the
    /// encoded key injected as `approval_key`; otherwise it goes to the
    /// approval queue. The registry entry is only written after the
    /// submission succeeded.
    pub async fn hold_for_approval(&self, mut job: Job) -> ApprovalResult<ApprovalKey> {
        let options = ApprovalOptions::extract(job.ensure_options())?;

        let id = self.ctx.registry.next_id().await?;
        let mut key = ApprovalKey::new(id);
        key.approval_message = options.message;
        key.approval_timeout = options.timeout;
        let encoded_key = key.encode()?;

        let delayed = match (key.delay(), &self.ctx.scheduler) {
            (Some(delay), Some(scheduler)) => Some((delay, scheduler)),
            _ => None,
        };

        let (value, parked) = match delayed {
            Some((delay, scheduler)) => {
                let destination = match job.queue.take() {
                    Some(queue) => queue,
                    None => self.ctx.config.destination_for(&job.class)?,
                };
                job.ensure_options()
                    .insert(APPROVAL_KEY.to_string(), Value::String(encoded_key.clone()));
                job.queue = Some(destination);

                let value = job.encode()?;
                scheduler.enqueue_delayed(delay, &value).await?;
                debug!("Scheduled {} for release in {:?}", encoded_key, delay);
                (value, Parked::Delayed)
            }
            None => {
                if key.delay().is_some() {
                    warn!(
                        "No delayed scheduler, {} waits on the approval queue without timeout",
                        encoded_key
                    );
                }
                job.queue = None;

                let value = job.encode()?;
                self.ctx
                    .queues
                    .enqueue(&self.ctx.config.approval_queue, &value)
                    .await?;
                (value, Parked::ApprovalQueue)
            }
        };

        if let Err(e) = self.ctx.registry.insert_raw(&encoded_key, &value).await {
            self.unpark(&value, parked).await;
            return Err(e);
        }

        info!("Job {} held for approval as {}", job.class, encoded_key);
        Ok(key)
    }

    /// Best-effort removal of a submission whose registry insert failed.
    async fn unpark(&self, value: &str, parked: Parked) {
        let result = match parked {
            Parked::ApprovalQueue => self
                .ctx
                .queues
                .remove_one_matching(&self.ctx.config.approval_queue, value)
                .await
                .map(|_| ()),
            Parked::Delayed => match &self.ctx.scheduler {
                Some(scheduler) => remove_delayed(scheduler.as_ref(), value).await.map(|_| ()),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!("Failed to withdraw unregistered job {}: {}", value, e);
        }
    }
}

/// Remove one matching delayed entry, scanning buckets earliest first.
pub(crate) async fn remove_delayed(
    scheduler: &dyn DelayedScheduler,
    encoded: &str,
) -> ApprovalResult<bool> {
    for location in scheduler.delayed_locations().await? {
        if scheduler.remove_delayed_matching(&location, encoded).await? > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
