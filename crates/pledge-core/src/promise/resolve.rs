//! Resolution procedure: decide how a produced value settles a promise.
//!
//! Given a target promise `D` and a produced value `x`:
//! 1. `x` is `D` itself -> reject with `CircularReference`
//! 2. `x` is one of our promises -> adopt its outcome (now if settled,
//!    otherwise when it settles)
//! 3. `x` is a foreign thenable -> read its continuation capability and call
//!    it with a one-shot latched resolver
//! 4. otherwise -> fulfill with `x`
//!
//! Every settlement goes through the task queue, so adopting a chain of
//! pending promises costs one queued job per link instead of stack depth.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::Promise;
use crate::domain::{FailureKind, PromiseError, Reason, Value};
use crate::ports::{Lookup, Thenable};

/// A value produced for a promise, tagged by how it must be resolved.
pub enum Resolvable<T, E> {
    /// A plain value: fulfill with it.
    Value(T),

    /// One of our promises: adopt its outcome.
    Promise(Promise<T, E>),

    /// A foreign thenable: assimilate it.
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T, E> Resolvable<T, E> {
    pub fn thenable(thenable: impl Thenable<T, E>) -> Self {
        Self::Thenable(Box::new(thenable))
    }
}

impl<T, E> From<Promise<T, E>> for Resolvable<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Self::Promise(promise)
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Resolvable<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolvable::Promise(promise) => f.debug_tuple("Promise").field(&promise.id()).finish(),
            Resolvable::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

/// The settle capability of a promise.
///
/// Handed to executors, to `Deferred`, and to foreign thenables. Cloning it
/// is cheap; all clones settle the same promise.
///
/// The resolver given to a thenable is latched: the first call through any
/// of its clones wins and every later call is ignored. Executor resolvers are
/// not latched; they rely on the promise's own pending check, so the first
/// transition to reach the task queue wins.
pub struct Resolver<T, E> {
    target: Promise<T, E>,
    latch: Option<Arc<AtomicBool>>,
}

impl<T: Value, E: Reason> Resolver<T, E> {
    pub(crate) fn new(target: Promise<T, E>) -> Self {
        Self {
            target,
            latch: None,
        }
    }

    fn latched(target: Promise<T, E>, latch: Arc<AtomicBool>) -> Self {
        Self {
            target,
            latch: Some(latch),
        }
    }

    /// Resolve with a value, a promise to adopt, or a thenable to assimilate.
    pub fn resolve(&self, x: impl Into<Resolvable<T, E>>) {
        if self.claim() {
            resolve_promise(&self.target, x.into());
        }
    }

    /// Resolve with a plain value.
    pub fn fulfill(&self, value: T) {
        self.resolve(Resolvable::Value(value));
    }

    /// Reject with `reason`, verbatim.
    pub fn reject(&self, reason: E) {
        if self.claim() {
            self.target.reject_later(reason);
        }
    }

    /// The promise this resolver settles.
    pub fn promise(&self) -> &Promise<T, E> {
        &self.target
    }

    /// Check-and-set the one-shot latch, if any.
    fn claim(&self) -> bool {
        match &self.latch {
            None => true,
            Some(latch) => {
                let first = !latch.swap(true, Ordering::AcqRel);
                if !first {
                    tracing::trace!(promise = %self.target.id(), "resolver already used; call ignored");
                }
                first
            }
        }
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            latch: self.latch.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.target.id())
            .field("latched", &self.latch.is_some())
            .finish()
    }
}

/// Run the resolution procedure for `target` with `x`.
pub(crate) fn resolve_promise<T: Value, E: Reason>(target: &Promise<T, E>, x: Resolvable<T, E>) {
    match x {
        Resolvable::Value(value) => target.fulfill_later(value),
        Resolvable::Promise(source) => adopt(target, source),
        Resolvable::Thenable(thenable) => assimilate(target, thenable),
    }
}

fn adopt<T: Value, E: Reason>(target: &Promise<T, E>, source: Promise<T, E>) {
    if source.ptr_eq(target) {
        target.fail(
            PromiseError::CircularReference(target.id()).into(),
            FailureKind::CircularReference,
        );
        return;
    }

    // Subscribe even when the source has settled: the extra queued hop lets
    // a transition scheduled after this call still win.
    tracing::trace!(promise = %target.id(), source = %source.id(), "adopting");
    let on_fulfilled = target.clone();
    let on_rejected = target.clone();
    source.subscribe(
        move |value| resolve_promise(&on_fulfilled, Resolvable::Value(value)),
        move |reason| on_rejected.fail(reason, FailureKind::ForeignReason),
    );
}

fn assimilate<T: Value, E: Reason>(target: &Promise<T, E>, thenable: Box<dyn Thenable<T, E>>) {
    let lookup = match panic::catch_unwind(AssertUnwindSafe(move || thenable.lookup())) {
        Ok(Ok(lookup)) => lookup,
        Ok(Err(reason)) => {
            target.fail(reason, FailureKind::ThenableAccessThrow);
            return;
        }
        Err(payload) => {
            target.fail(
                PromiseError::from_panic(payload).into(),
                FailureKind::ThenableAccessThrow,
            );
            return;
        }
    };

    let hook = match lookup {
        Lookup::Callable(hook) => hook,
        Lookup::Plain(value) => {
            target.fulfill_later(value);
            return;
        }
    };

    let latch = Arc::new(AtomicBool::new(false));
    let resolver = Resolver::latched(target.clone(), Arc::clone(&latch));
    let reason = match panic::catch_unwind(AssertUnwindSafe(move || hook(resolver))) {
        Ok(Ok(())) => return,
        Ok(Err(reason)) => reason,
        Err(payload) => PromiseError::from_panic(payload).into(),
    };

    if latch.swap(true, Ordering::AcqRel) {
        tracing::trace!(promise = %target.id(), "thenable failed after settling; ignored");
    } else {
        target.fail(reason, FailureKind::ThenableInvokeThrow);
    }
}
