//! Continuation registration.
//!
//! Every registration returns a fresh downstream promise, whatever the state
//! of the receiver. Each registration carries both handlers, and exactly one
//! of them runs, for whichever outcome happens.

use std::panic::{self, AssertUnwindSafe};

use super::{Promise, Resolvable, resolve_promise};
use crate::domain::{FailureKind, PromiseError, Reason, Value};

/// What a handler produces: `Ok` resolves the downstream promise, `Err`
/// rejects it with that exact reason.
pub type HandlerResult<T, E> = Result<Resolvable<T, E>, E>;

/// Boxed fulfillment handler, for `then_optional`.
pub type OnFulfilled<T, U, E> = Box<dyn FnOnce(T) -> HandlerResult<U, E> + Send>;

/// Boxed rejection handler, for `then_optional`.
pub type OnRejected<U, E> = Box<dyn FnOnce(E) -> HandlerResult<U, E> + Send>;

impl<T: Value, E: Reason> Promise<T, E> {
    /// Register both handlers and return the downstream promise.
    ///
    /// The matching handler runs as a queued job after this promise settles
    /// (immediately queued if it already has). Its result goes through the
    /// resolution procedure; `Err` or a panic rejects the downstream promise.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> HandlerResult<U, E> + Send + 'static,
        R: FnOnce(E) -> HandlerResult<U, E> + Send + 'static,
    {
        let downstream = Promise::pending(self.scheduler());
        tracing::trace!(promise = %self.id(), downstream = %downstream.id(), "continuation registered");

        let fulfilled_target = downstream.clone();
        let rejected_target = downstream.clone();
        self.subscribe(
            move |value| run_handler(&fulfilled_target, on_fulfilled, value),
            move |reason| run_handler(&rejected_target, on_rejected, reason),
        );
        downstream
    }

    /// `then` with the default rejection handler: the reason passes through.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> HandlerResult<U, E> + Send + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// `then` with the default fulfillment handler: the value passes through.
    pub fn or_else<R>(&self, on_rejected: R) -> Promise<T, E>
    where
        R: FnOnce(E) -> HandlerResult<T, E> + Send + 'static,
    {
        self.then(|value| Ok(Resolvable::Value(value)), on_rejected)
    }

    /// Transform the value; rejections pass through.
    pub fn map<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(move |value| Ok(Resolvable::Value(f(value))))
    }

    /// `then` where either handler may be absent. A missing handler is
    /// replaced by its default: pass the value through, or re-raise the
    /// reason.
    pub fn then_optional(
        &self,
        on_fulfilled: Option<OnFulfilled<T, T, E>>,
        on_rejected: Option<OnRejected<T, E>>,
    ) -> Promise<T, E> {
        self.then(
            move |value| match on_fulfilled {
                Some(handler) => handler(value),
                None => Ok(Resolvable::Value(value)),
            },
            move |reason| match on_rejected {
                Some(handler) => handler(reason),
                None => Err(reason),
            },
        )
    }
}

fn run_handler<A, U, E, H>(downstream: &Promise<U, E>, handler: H, arg: A)
where
    U: Value,
    E: Reason,
    H: FnOnce(A) -> HandlerResult<U, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(move || handler(arg))) {
        Ok(Ok(x)) => resolve_promise(downstream, x),
        Ok(Err(reason)) => downstream.fail(reason, FailureKind::HandlerThrow),
        Err(payload) => downstream.fail(
            PromiseError::from_panic(payload).into(),
            FailureKind::HandlerThrow,
        ),
    }
}
