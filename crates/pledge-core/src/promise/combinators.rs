//! Combinators and factories.

use std::sync::{Arc, Mutex};

use super::{Promise, Resolvable, Resolver, resolve_promise};
use crate::domain::{PromiseError, Reason, Value};
use crate::scheduler::Scheduler;
use crate::sync::lock;

/// A promise together with its settle capability, for settling from outside
/// an executor closure.
pub struct Deferred<T, E = PromiseError> {
    pub promise: Promise<T, E>,
    pub resolver: Resolver<T, E>,
}

impl<T: Value, E: Reason> Deferred<T, E> {
    pub fn resolve(&self, x: impl Into<Resolvable<T, E>>) {
        self.resolver.resolve(x);
    }

    pub fn fulfill(&self, value: T) {
        self.resolver.fulfill(value);
    }

    pub fn reject(&self, reason: E) {
        self.resolver.reject(reason);
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

/// Per-call bookkeeping for `all`.
struct Gather<T> {
    results: Vec<Option<T>>,
    remaining: usize,
}

impl<T: Value, E: Reason> Promise<T, E> {
    /// A promise resolved with `x` through the resolution procedure: a
    /// promise is adopted, a thenable assimilated, a value fulfilled.
    pub fn resolve(scheduler: &Scheduler, x: impl Into<Resolvable<T, E>>) -> Self {
        let promise = Self::pending(scheduler);
        resolve_promise(&promise, x.into());
        promise
    }

    /// A promise fulfilled with `value`.
    pub fn fulfilled(scheduler: &Scheduler, value: T) -> Self {
        Self::resolve(scheduler, Resolvable::Value(value))
    }

    /// A promise rejected with `reason`, verbatim.
    pub fn reject(scheduler: &Scheduler, reason: E) -> Self {
        let promise = Self::pending(scheduler);
        promise.reject_later(reason);
        promise
    }

    /// A pending promise plus its resolver.
    pub fn deferred(scheduler: &Scheduler) -> Deferred<T, E> {
        let promise = Self::pending(scheduler);
        let resolver = Resolver::new(promise.clone());
        Deferred { promise, resolver }
    }

    /// Settle like the first input to settle.
    ///
    /// Every input gets callbacks registered; outcomes arriving after the
    /// first are discarded, not cancelled. With no inputs the result stays
    /// pending forever.
    pub fn race<I>(scheduler: &Scheduler, inputs: I) -> Self
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let promise = Self::pending(scheduler);
        for input in inputs {
            let on_fulfilled = promise.clone();
            let on_rejected = promise.clone();
            input.subscribe(
                move |value| on_fulfilled.fulfill_later(value),
                move |reason| on_rejected.reject_later(reason),
            );
        }
        promise
    }

    /// Fulfill with every input's value, in input order, once all have
    /// fulfilled; reject with the first rejection. With no inputs the result
    /// fulfills with an empty vector.
    pub fn all<I>(scheduler: &Scheduler, inputs: I) -> Promise<Vec<T>, E>
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let inputs: Vec<Promise<T, E>> = inputs.into_iter().collect();
        let promise = Promise::<Vec<T>, E>::pending(scheduler);
        if inputs.is_empty() {
            promise.fulfill_later(Vec::new());
            return promise;
        }

        let gather = Arc::new(Mutex::new(Gather {
            results: vec![None; inputs.len()],
            remaining: inputs.len(),
        }));

        for (index, input) in inputs.into_iter().enumerate() {
            let on_fulfilled = promise.clone();
            let on_rejected = promise.clone();
            let slots = Arc::clone(&gather);
            input.subscribe(
                move |value| {
                    let mut gather = lock(&slots);
                    if gather.results[index].is_none() {
                        gather.results[index] = Some(value);
                        gather.remaining -= 1;
                    }
                    if gather.remaining == 0 {
                        let values: Option<Vec<T>> =
                            gather.results.iter_mut().map(Option::take).collect();
                        drop(gather);
                        if let Some(values) = values {
                            on_fulfilled.fulfill_later(values);
                        }
                    }
                },
                move |reason| on_rejected.reject_later(reason),
            );
        }
        promise
    }
}
