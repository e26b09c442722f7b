//! Promise identifiers.
//!
//! Every promise gets a ULID at construction time. The id is only used for
//! logging and error reporting; identity checks (self-adoption) compare the
//! shared allocation, not the id.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a single promise instance.
///
/// Displayed as `promise-<ulid>` so log lines can be grepped per promise.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromiseId(Ulid);

impl PromiseId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise-{}", self.0)
    }
}

impl From<Ulid> for PromiseId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}
