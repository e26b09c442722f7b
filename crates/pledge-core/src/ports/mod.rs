//! Ports - seams to the collaborators the promise core does not own.
//!
//! - **TaskQueue**: the host's deferred-execution substrate
//! - **Thenable**: foreign objects speaking the resolve/reject protocol

pub mod task_queue;
pub mod thenable;

pub use self::task_queue::{Job, QueueError, TaskQueue};
pub use self::thenable::{FnThenable, Lookup, ThenHook, Thenable};
