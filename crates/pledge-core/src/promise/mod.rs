//! Promise - a single-assignment container settled exactly once.
//!
//! # Layers
//! - **settlement** (this file): state, callback queues, guarded transitions
//! - **resolve**: the resolution procedure and the `Resolver` capability
//! - **then**: continuation registration
//! - **combinators**: `resolve`, `reject`, `race`, `all`, `deferred`
//! - **settled**: `std::future::Future` adapter
//! - **teardown**: iterative release of abandoned callback chains

mod combinators;
mod resolve;
mod settled;
mod teardown;
mod then;

pub use self::combinators::Deferred;
pub use self::resolve::{Resolvable, Resolver};
pub use self::settled::Settled;
pub use self::then::{HandlerResult, OnFulfilled, OnRejected};

pub(crate) use self::resolve::resolve_promise;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::domain::{FailureKind, PromiseError, PromiseId, PromiseStatus, Reason, State, Value};
use crate::scheduler::Scheduler;
use crate::sync::{lock, lock_mut};

type Callback<A> = Box<dyn FnOnce(A) + Send>;

/// A queued `Handlers<T, E>`, type-erased so `Shared` can hand it to the
/// teardown worklist without knowing `T` and `E`.
type Queued = Box<dyn Any + Send>;

/// A deferred value.
///
/// `Promise` is a shared handle: clones observe and settle the same
/// underlying state. It starts `Pending` and transitions once, to either
/// `Fulfilled(value)` or `Rejected(reason)`.
///
/// Transitions and continuations never run inside the call that triggered
/// them; they are submitted to the [`Scheduler`]'s task queue.
pub struct Promise<T, E = PromiseError> {
    shared: Arc<Shared<T, E>>,
}

struct Shared<T, E> {
    id: PromiseId,
    scheduler: Scheduler,
    inner: Mutex<Inner<T, E>>,
}

enum Settlement<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

struct Inner<T, E> {
    settlement: Settlement<T, E>,

    /// Populated only while pending; drained once at settlement.
    queued: Vec<Queued>,
}

/// One registration: exactly one side runs.
struct Handlers<T, E> {
    on_fulfilled: Callback<T>,
    on_rejected: Callback<E>,
}

impl<T, E> Settlement<T, E> {
    fn state(&self) -> State {
        match self {
            Settlement::Pending => State::Pending,
            Settlement::Fulfilled(_) => State::Fulfilled,
            Settlement::Rejected(_) => State::Rejected,
        }
    }
}

impl<T: Value, E: Reason> Promise<T, E> {
    /// Create a promise and run `executor` synchronously.
    ///
    /// The executor receives the promise's [`Resolver`]. Returning `Err` or
    /// panicking rejects the promise (unless it already settled).
    ///
    /// ```ignore
    /// let p: Promise<u32> = Promise::new(&scheduler, |resolver| {
    ///     resolver.fulfill(7);
    ///     Ok(())
    /// });
    /// ```
    pub fn new<F>(scheduler: &Scheduler, executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let promise = Self::pending(scheduler);
        let resolver = Resolver::new(promise.clone());
        let handle = resolver.clone();

        match panic::catch_unwind(AssertUnwindSafe(move || executor(handle))) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => resolver.reject(reason),
            Err(payload) => {
                let reason = PromiseError::from_panic(payload);
                tracing::debug!(promise = %promise.id(), error = %reason, "executor panicked");
                resolver.reject(reason.into());
            }
        }
        promise
    }

    pub(crate) fn pending(scheduler: &Scheduler) -> Self {
        let id = PromiseId::generate();
        tracing::trace!(promise = %id, "promise created");
        Self {
            shared: Arc::new(Shared {
                id,
                scheduler: scheduler.clone(),
                inner: Mutex::new(Inner {
                    settlement: Settlement::Pending,
                    queued: Vec::new(),
                }),
            }),
        }
    }

    /// Schedule the transition to `Fulfilled`. It only applies if the promise
    /// is still pending when the job runs.
    pub(crate) fn fulfill_later(&self, value: T) {
        let shared = Arc::clone(&self.shared);
        self.shared
            .scheduler
            .defer(move || shared.transition(Ok(value)));
    }

    /// Schedule the transition to `Rejected`, guarded like `fulfill_later`.
    pub(crate) fn reject_later(&self, reason: E) {
        let shared = Arc::clone(&self.shared);
        self.shared
            .scheduler
            .defer(move || shared.transition(Err(reason)));
    }

    /// `reject_later` for failures that originate in the core.
    pub(crate) fn fail(&self, reason: E, kind: FailureKind) {
        tracing::debug!(promise = %self.id(), kind = %kind, "rejecting");
        self.reject_later(reason);
    }

    /// Register raw callbacks.
    ///
    /// While pending they are queued; once settled the matching one is
    /// submitted to the task queue right away. Either way it never runs
    /// inside this call.
    pub(crate) fn subscribe<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(E) + Send + 'static,
    {
        let mut inner = lock(&self.shared.inner);
        let settled = match &inner.settlement {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value.clone())),
            Settlement::Rejected(reason) => Some(Err(reason.clone())),
        };
        match settled {
            None => {
                let handlers: Handlers<T, E> = Handlers {
                    on_fulfilled: Box::new(on_fulfilled),
                    on_rejected: Box::new(on_rejected),
                };
                inner.queued.push(Box::new(handlers));
            }
            Some(Ok(value)) => {
                drop(inner);
                self.shared.scheduler.defer(move || on_fulfilled(value));
            }
            Some(Err(reason)) => {
                drop(inner);
                self.shared.scheduler.defer(move || on_rejected(reason));
            }
        }
    }

    /// The settled value and reason, if any.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        match &lock(&self.shared.inner).settlement {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value.clone())),
            Settlement::Rejected(reason) => Some(Err(reason.clone())),
        }
    }

    pub fn value(&self) -> Option<T> {
        self.outcome().and_then(Result::ok)
    }

    pub fn reason(&self) -> Option<E> {
        self.outcome().and_then(Result::err)
    }
}

impl<T, E> Promise<T, E> {
    pub fn id(&self) -> PromiseId {
        self.shared.id
    }

    pub fn state(&self) -> State {
        lock(&self.shared.inner).settlement.state()
    }

    pub fn status(&self) -> PromiseStatus {
        let inner = lock(&self.shared.inner);
        PromiseStatus {
            id: self.shared.id,
            state: inner.settlement.state(),
            queued_on_fulfilled: inner.queued.len(),
            queued_on_rejected: inner.queued.len(),
        }
    }

    /// The scheduler this promise (and everything derived from it) uses.
    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }

    /// Do both handles refer to the same promise?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T: Value, E: Value> Shared<T, E> {
    /// Apply the outcome if still pending and hand the matching callback of
    /// every registration to the task queue, in registration order.
    fn transition(&self, outcome: Result<T, E>) {
        let stored = match &outcome {
            Ok(value) => Settlement::Fulfilled(value.clone()),
            Err(reason) => Settlement::Rejected(reason.clone()),
        };

        let queued = {
            let mut inner = lock(&self.inner);
            if inner.settlement.state().is_settled() {
                tracing::trace!(promise = %self.id, "already settled; transition ignored");
                return;
            }
            inner.settlement = stored;
            std::mem::take(&mut inner.queued)
        };

        // only `subscribe` pushes, always as `Handlers<T, E>`
        let handlers = queued
            .into_iter()
            .filter_map(|entry| entry.downcast::<Handlers<T, E>>().ok());

        match outcome {
            Ok(value) => {
                tracing::trace!(promise = %self.id, "fulfilled");
                for entry in handlers {
                    let Handlers { on_fulfilled, .. } = *entry;
                    let value = value.clone();
                    self.scheduler.defer(move || on_fulfilled(value));
                }
            }
            Err(reason) => {
                tracing::trace!(promise = %self.id, "rejected");
                for entry in handlers {
                    let Handlers { on_rejected, .. } = *entry;
                    let reason = reason.clone();
                    self.scheduler.defer(move || on_rejected(reason));
                }
            }
        }
    }
}

impl<T, E> Drop for Shared<T, E> {
    fn drop(&mut self) {
        let queued = std::mem::take(&mut lock_mut(&mut self.inner).queued);
        teardown::release(queued);
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}
