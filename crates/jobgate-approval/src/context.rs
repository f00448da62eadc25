//! Shared wiring of the gate and the resolution engine.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ApprovalConfig;
use crate::registry::PendingRegistry;
use crate::store::{DelayedScheduler, HashStore, QueueAdapter};

/// Configuration, registry and queue collaborators used by both
/// [`ApprovalGate`](crate::ApprovalGate) and
/// [`ResolutionEngine`](crate::ResolutionEngine).
#[derive(Clone)]
pub struct ApprovalContext {
    pub(crate) config: Arc<ApprovalConfig>,
    pub(crate) registry: PendingRegistry,
    pub(crate) queues: Arc<dyn QueueAdapter>,
    pub(crate) scheduler: Option<Arc<dyn DelayedScheduler>>,
}

impl ApprovalContext {
    /// Create a context without delayed scheduling.
    pub fn new(
        config: ApprovalConfig,
        store: Arc<dyn HashStore>,
        queues: Arc<dyn QueueAdapter>,
    ) -> Self {
        let registry = PendingRegistry::new(store, config.pending_bucket.clone());
        Self {
            config: Arc::new(config),
            registry,
            queues,
            scheduler: None,
        }
    }

    /// Create a context over a broker providing every capability.
    pub fn from_broker<B>(config: ApprovalConfig, broker: Arc<B>) -> Self
    where
        B: HashStore + QueueAdapter + DelayedScheduler + 'static,
    {
        Self::new(config, broker.clone(), broker.clone()).with_scheduler(broker)
    }

    /// Attach the delayed scheduling capability.
    ///
    /// Ignored when `delayed_enabled` is off in the configuration.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn DelayedScheduler>) -> Self {
        if self.config.delayed_enabled {
            debug!("Delayed scheduling enabled for approval timeouts");
            self.scheduler = Some(scheduler);
        } else {
            warn!("Delayed scheduling disabled by configuration, timeouts will not release jobs");
        }
        self
    }

    /// Whether timeouts can use delayed scheduling.
    pub fn supports_delayed(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    pub fn registry(&self) -> &PendingRegistry {
        &self.registry
    }
}
