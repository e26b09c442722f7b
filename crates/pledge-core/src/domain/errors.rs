//! Errors raised by the promise core and their classification.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::ids::PromiseId;

/// Reasons the core itself can reject a promise with.
///
/// This is also the default reason type of `Promise<T>`. Custom reason types
/// must implement `From<PromiseError>` so the core can report circular
/// references and caught panics through them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// A promise was resolved with itself.
    #[error("chaining cycle detected: {0} was resolved with itself")]
    CircularReference(PromiseId),

    /// An executor, handler or thenable hook panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// Opaque rejection supplied by calling code.
    #[error("{0}")]
    Rejected(String),
}

impl PromiseError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Convert a `catch_unwind` payload into `Panicked`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

/// How a rejection came about.
///
/// Reasons are passed through verbatim, so this is never part of the reason
/// itself; it is attached to log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The promise was resolved with itself.
    CircularReference,
    /// A registered continuation returned `Err` or panicked.
    HandlerThrow,
    /// Reading a foreign thenable's continuation capability failed.
    ThenableAccessThrow,
    /// Invoking a foreign thenable's continuation capability failed before
    /// either of its settle arguments fired.
    ThenableInvokeThrow,
    /// An explicit rejection from calling code.
    ForeignReason,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::CircularReference => "circular_reference",
            FailureKind::HandlerThrow => "handler_throw",
            FailureKind::ThenableAccessThrow => "thenable_access_throw",
            FailureKind::ThenableInvokeThrow => "thenable_invoke_throw",
            FailureKind::ForeignReason => "foreign_reason",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn circular_reference_names_the_promise() {
        let id = PromiseId::generate();
        let msg = PromiseError::CircularReference(id).to_string();
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| -> u8 { panic!("boom") }).unwrap_err();
        assert_eq!(
            PromiseError::from_panic(payload),
            PromiseError::Panicked("boom".to_string())
        );

        let payload = panic::catch_unwind(|| -> u8 { panic!("code {}", 7) }).unwrap_err();
        assert_eq!(
            PromiseError::from_panic(payload),
            PromiseError::Panicked("code 7".to_string())
        );
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::HandlerThrow.to_string(), "handler_throw");
        assert_eq!(
            FailureKind::ThenableInvokeThrow.to_string(),
            "thenable_invoke_throw"
        );
    }
}
