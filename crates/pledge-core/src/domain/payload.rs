//! Bounds shared by every value and reason that flows through a promise.

use super::errors::PromiseError;

/// A settled value.
///
/// `Clone` because every continuation registered on a promise receives its
/// own copy; `Send + 'static` because continuations run as queued jobs.
pub trait Value: Clone + Send + 'static {}

impl<T> Value for T where T: Clone + Send + 'static {}

/// A rejection reason.
///
/// The core rejects with its own errors (cycles, caught panics), so reasons
/// must be constructible from [`PromiseError`].
pub trait Reason: Value + From<PromiseError> {}

impl<E> Reason for E where E: Value + From<PromiseError> {}
