//! ChannelQueue - jobs drained by a tokio task.

use std::panic::{self, AssertUnwindSafe};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::QueueConfig;
use crate::ports::{Job, QueueError, TaskQueue};

/// ChannelQueue sends jobs to a worker task over an unbounded channel.
///
/// Jobs run one at a time on the worker, in submission order. Create with
/// [`ChannelQueue::spawn`] inside a tokio runtime.
#[derive(Clone)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<Job>,
    label: String,
}

/// Worker handle.
/// - `request_shutdown` stops the worker after what is already queued
/// - `shutdown_and_join` also waits for it and returns how many jobs ran
pub struct QueueWorker {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<usize>,
}

impl ChannelQueue {
    pub fn spawn(config: QueueConfig) -> (Self, QueueWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let label = config.label.clone();
        let join = tokio::spawn(async move { drain_loop(config, rx, shutdown_rx).await });

        (Self { tx, label }, QueueWorker { shutdown_tx, join })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TaskQueue for ChannelQueue {
    fn submit(&self, job: Job) -> Result<(), QueueError> {
        self.tx.send(job).map_err(|_| QueueError::Closed)
    }
}

impl QueueWorker {
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) -> Result<usize, QueueError> {
        self.request_shutdown();
        self.join
            .await
            .map_err(|e| QueueError::Worker(e.to_string()))
    }
}

async fn drain_loop(
    config: QueueConfig,
    mut rx: mpsc::UnboundedReceiver<Job>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> usize {
    tracing::debug!(queue = %config.label, "queue worker started");
    let mut ran = 0;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let job = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            job = rx.recv() => job,
        };

        // every sender dropped
        let Some(job) = job else {
            break;
        };
        run_job(&config.label, job);
        ran += 1;
    }

    // Finish what is already queued, including follow-ups, up to the limit.
    let mut flushed = 0;
    while flushed < config.max_steps {
        let Ok(job) = rx.try_recv() else {
            break;
        };
        run_job(&config.label, job);
        flushed += 1;
    }
    let abandoned = rx.len();
    if abandoned > 0 {
        tracing::warn!(
            queue = %config.label,
            abandoned,
            "step limit reached during shutdown; remaining jobs dropped"
        );
    }
    rx.close();

    tracing::debug!(queue = %config.label, ran, flushed, "queue worker stopped");
    ran + flushed
}

fn run_job(label: &str, job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::warn!(queue = %label, "job panicked");
    }
}
