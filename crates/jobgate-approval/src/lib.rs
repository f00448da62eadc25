//! # jobgate approval
//!
//! Approval gate for background job queues.
//!
//! ## Features
//!
//! - Pre-enqueue hook that parks jobs flagged `requires_approval`
//! - Pending registry keyed by canonical approval keys
//! - Approve / reject with exactly-once resolution
//! - Optional timeout release through a delayed scheduler
//! - In-memory and file-backed brokers

pub mod broker;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod job;
pub mod key;
pub mod options;
pub mod registry;
pub mod resolution;
pub mod store;

pub use broker::{FileBroker, MemoryBroker};
pub use config::ApprovalConfig;
pub use context::ApprovalContext;
pub use error::{ApprovalError, ApprovalResult};
pub use gate::{ApprovalGate, Submission};
pub use job::Job;
pub use key::ApprovalKey;
pub use options::ApprovalOptions;
pub use registry::PendingRegistry;
pub use resolution::ResolutionEngine;
pub use store::{DelayedScheduler, HashStore, QueueAdapter};
