//! Await a promise from async code.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use super::Promise;
use crate::domain::{Reason, Value};
use crate::sync::lock;

/// Future resolving to a promise's outcome.
///
/// The outcome is delivered through the promise's task queue like any other
/// continuation, so the queue must be drained for the future to complete.
pub struct Settled<T, E> {
    slot: Arc<Mutex<Slot<T, E>>>,
}

struct Slot<T, E> {
    outcome: Option<Result<T, E>>,
    waker: Option<Waker>,
}

impl<T, E> Slot<T, E> {
    fn fill(&mut self, outcome: Result<T, E>) -> Option<Waker> {
        self.outcome = Some(outcome);
        self.waker.take()
    }
}

impl<T: Value, E: Reason> Promise<T, E> {
    pub fn settled(&self) -> Settled<T, E> {
        let slot = Arc::new(Mutex::new(Slot {
            outcome: None,
            waker: None,
        }));

        let on_fulfilled = Arc::clone(&slot);
        let on_rejected = Arc::clone(&slot);
        self.subscribe(
            move |value| {
                if let Some(waker) = lock(&on_fulfilled).fill(Ok(value)) {
                    waker.wake();
                }
            },
            move |reason| {
                if let Some(waker) = lock(&on_rejected).fill(Err(reason)) {
                    waker.wake();
                }
            },
        );
        Settled { slot }
    }
}

impl<T, E> Future for Settled<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = lock(&self.slot);
        match slot.outcome.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T: Value, E: Reason> IntoFuture for Promise<T, E> {
    type Output = Result<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::domain::PromiseError;
    use crate::impls::ChannelQueue;
    use crate::scheduler::Scheduler;
    use std::time::Duration;

    #[tokio::test]
    async fn await_fulfilled_value() {
        let (queue, worker) = ChannelQueue::spawn(QueueConfig::default_v1());
        let scheduler = Scheduler::new(queue);

        let p: Promise<i32> = Promise::fulfilled(&scheduler, 3);
        assert_eq!(p.map(|v| v * 10).await, Ok(30));

        worker.shutdown_and_join().await.unwrap();
    }

    #[tokio::test]
    async fn await_rejection() {
        let (queue, worker) = ChannelQueue::spawn(QueueConfig::default_v1());
        let scheduler = Scheduler::new(queue);

        let p: Promise<i32> = Promise::reject(&scheduler, PromiseError::rejected("no"));
        assert_eq!(p.settled().await, Err(PromiseError::rejected("no")));

        worker.shutdown_and_join().await.unwrap();
    }

    #[tokio::test]
    async fn await_value_settled_from_another_task() {
        let (queue, worker) = ChannelQueue::spawn(QueueConfig::default_v1());
        let scheduler = Scheduler::new(queue);

        let d = Promise::<&'static str>::deferred(&scheduler);
        let handle = d.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle.fulfill("later");
        });

        assert_eq!(d.promise.await, Ok("later"));
        worker.shutdown_and_join().await.unwrap();
    }
}
