//! Scheduler - the handle through which promises reach the host task queue.

use std::fmt;
use std::sync::Arc;

use crate::ports::{Job, TaskQueue};

/// Scheduler wraps the injected [`TaskQueue`].
///
/// Every promise keeps a clone and submits its jobs through it; promises
/// derived from it (`then`, combinators) inherit the same queue. There is no
/// ambient global queue: tests substitute a `ManualQueue` and step it.
///
/// ```ignore
/// let queue = Arc::new(ManualQueue::new());
/// let scheduler = Scheduler::new(queue.clone());
/// let p: Promise<i32> = Promise::fulfilled(&scheduler, 1);
/// queue.run_until_idle()?;
/// ```
#[derive(Clone)]
pub struct Scheduler {
    queue: Arc<dyn TaskQueue>,
}

impl Scheduler {
    pub fn new<Q: TaskQueue + 'static>(queue: Q) -> Self {
        Self {
            queue: Arc::new(queue),
        }
    }

    pub fn from_arc(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// Submit a job. A queue that refuses it drops the job; the promise that
    /// needed it stays pending.
    pub(crate) fn defer<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job: Job = Box::new(job);
        if let Err(err) = self.queue.submit(job) {
            tracing::warn!(error = %err, "task queue rejected job; it will never run");
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ManualQueue;
    use std::sync::Mutex;

    #[test]
    fn defer_never_runs_inline() {
        let queue = Arc::new(ManualQueue::new());
        let scheduler = Scheduler::new(queue.clone());
        let ran = Arc::new(Mutex::new(false));

        let flag = ran.clone();
        scheduler.defer(move || *flag.lock().unwrap() = true);

        assert!(!*ran.lock().unwrap());
        assert_eq!(queue.len(), 1);
        queue.run_until_idle().unwrap();
        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn clones_share_the_queue() {
        let queue = Arc::new(ManualQueue::new());
        let a = Scheduler::new(queue.clone());
        let b = a.clone();

        a.defer(|| {});
        b.defer(|| {});
        assert_eq!(queue.len(), 2);
    }
}
