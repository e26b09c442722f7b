//! TaskQueue port - the host's deferred-execution substrate.
//!
//! The promise core never runs a callback inline. Every transition and every
//! continuation is submitted here as a job and runs after the submitting code
//! has returned to the host.

use std::sync::Arc;

use thiserror::Error;

/// A zero-argument unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// TaskQueue accepts jobs for later execution.
///
/// # Contract
/// - A submitted job must not run before `submit` returns.
/// - Jobs run in FIFO submission order.
/// - Jobs run one at a time (cooperative scheduling); a job may submit more
///   jobs, which run after everything already queued.
pub trait TaskQueue: Send + Sync {
    fn submit(&self, job: Job) -> Result<(), QueueError>;
}

impl<Q: TaskQueue + ?Sized> TaskQueue for Arc<Q> {
    fn submit(&self, job: Job) -> Result<(), QueueError> {
        (**self).submit(job)
    }
}

/// Errors reported by task queue implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue no longer accepts jobs (its worker has stopped).
    #[error("task queue is closed")]
    Closed,

    /// A drain ran the configured number of jobs and work was still queued.
    #[error("step limit exceeded after {0} jobs")]
    StepLimitExceeded(usize),

    /// The worker draining the queue terminated abnormally.
    #[error("queue worker failed: {0}")]
    Worker(String),
}
