//! ManualQueue - a FIFO the caller drains explicitly.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::config::QueueConfig;
use crate::ports::{Job, QueueError, TaskQueue};
use crate::sync::lock;

/// ManualQueue holds submitted jobs until the caller runs them.
///
/// Nothing runs in the background. `run_next` runs one job, `tick` runs the
/// jobs queued at the time of the call, `run_until_idle` runs until the queue
/// is empty (bounded by `max_steps`).
///
/// ```ignore
/// let queue = Arc::new(ManualQueue::new());
/// let scheduler = Scheduler::new(queue.clone());
/// let p: Promise<i32> = Promise::fulfilled(&scheduler, 1);
/// assert_eq!(p.state(), State::Pending);
/// queue.run_until_idle()?;
/// assert_eq!(p.state(), State::Fulfilled);
/// ```
pub struct ManualQueue {
    jobs: Mutex<VecDeque<Job>>,
    config: QueueConfig,
}

impl ManualQueue {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default_v1())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Number of jobs waiting.
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.jobs).is_empty()
    }

    /// Run the oldest job. Returns `false` if there was none.
    ///
    /// The lock is released before the job runs, so the job may submit more.
    pub fn run_next(&self) -> bool {
        let job = lock(&self.jobs).pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run the jobs that were queued when this was called. Jobs they submit
    /// wait for the next tick. Returns how many ran.
    pub fn tick(&self) -> usize {
        let batch = self.len();
        let mut ran = 0;
        while ran < batch && self.run_next() {
            ran += 1;
        }
        tracing::trace!(queue = %self.config.label, ran, "tick");
        ran
    }

    /// Run jobs until the queue is empty.
    ///
    /// # Errors
    /// `StepLimitExceeded` if `max_steps` jobs ran and work remains, which
    /// usually means a continuation keeps re-queueing itself.
    pub fn run_until_idle(&self) -> Result<usize, QueueError> {
        let mut steps = 0;
        while self.run_next() {
            steps += 1;
            if steps >= self.config.max_steps && !self.is_empty() {
                tracing::warn!(queue = %self.config.label, steps, "step limit exceeded");
                return Err(QueueError::StepLimitExceeded(steps));
            }
        }
        tracing::trace!(queue = %self.config.label, steps, "queue idle");
        Ok(steps)
    }
}

impl Default for ManualQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue for ManualQueue {
    fn submit(&self, job: Job) -> Result<(), QueueError> {
        lock(&self.jobs).push_back(job);
        Ok(())
    }
}
