//! Settlement state of a promise.

use serde::{Deserialize, Serialize};

use super::ids::PromiseId;

/// Promise state.
///
/// State transitions:
/// - Pending -> Fulfilled
/// - Pending -> Rejected
///
/// Nothing else is observable: once a promise leaves `Pending` it never
/// changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Not settled yet; continuations are queued.
    Pending,

    /// Settled with a value.
    Fulfilled,

    /// Settled with a reason.
    Rejected,
}

impl State {
    /// Is this a terminal state (no further transitions)?
    pub fn is_settled(self) -> bool {
        !matches!(self, State::Pending)
    }
}

/// Serializable snapshot of a promise, for logging and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseStatus {
    pub id: PromiseId,
    pub state: State,

    /// Continuations waiting for fulfillment. Always 0 once settled.
    pub queued_on_fulfilled: usize,

    /// Continuations waiting for rejection. Always 0 once settled.
    pub queued_on_rejected: usize,
}
