//! Thenable port - foreign objects that expose a continuation capability.
//!
//! A thenable is anything that is not one of our own promises but can still
//! report an eventual value through the same resolve/reject protocol. The
//! resolution procedure assimilates it.

use crate::promise::Resolver;

/// The continuation capability of a thenable.
///
/// It receives a latched [`Resolver`] for the promise being resolved. Only the
/// first `resolve`/`fulfill`/`reject` call through that resolver (or any clone
/// of it) has an effect. Returning `Err` counts only if none of them fired yet.
pub type ThenHook<T, E> = Box<dyn FnOnce(Resolver<T, E>) -> Result<(), E> + Send>;

/// Result of reading a thenable's continuation capability.
pub enum Lookup<T, E> {
    /// The capability exists and is callable.
    Callable(ThenHook<T, E>),

    /// The capability is not callable: the object is a plain value and the
    /// promise fulfills with it.
    Plain(T),
}

/// A foreign thenable.
pub trait Thenable<T, E>: Send + 'static {
    /// Read the continuation capability.
    ///
    /// `Err` means reading it failed; the promise rejects with that reason.
    fn lookup(self: Box<Self>) -> Result<Lookup<T, E>, E>;
}

/// Adapts a closure into a [`Thenable`] whose capability is always callable.
///
/// ```ignore
/// let foreign = FnThenable::new(|resolver: Resolver<i32, PromiseError>| {
///     resolver.fulfill(42);
///     Ok(())
/// });
/// let promise = Promise::resolve(&scheduler, Resolvable::thenable(foreign));
/// ```
pub struct FnThenable<F>(F);

impl<F> FnThenable<F> {
    pub fn new<T, E>(hook: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E> + Send + 'static,
    {
        Self(hook)
    }
}

impl<T, E, F> Thenable<T, E> for FnThenable<F>
where
    F: FnOnce(Resolver<T, E>) -> Result<(), E> + Send + 'static,
{
    fn lookup(self: Box<Self>) -> Result<Lookup<T, E>, E> {
        Ok(Lookup::Callable(Box::new(self.0)))
    }
}
