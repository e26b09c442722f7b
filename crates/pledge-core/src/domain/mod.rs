//! Domain model: ids, settlement state, error taxonomy, payload bounds.

pub mod errors;
pub mod ids;
pub mod payload;
pub mod state;

pub use self::errors::{FailureKind, PromiseError};
pub use self::ids::PromiseId;
pub use self::payload::{Reason, Value};
pub use self::state::{PromiseStatus, State};
