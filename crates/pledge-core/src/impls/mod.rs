//! Task queue implementations.
//!
//! - `ManualQueue`: stepped by the caller; deterministic, for tests and
//!   single-threaded hosts
//! - `ChannelQueue`: drained by a tokio task

pub mod channel_queue;
pub mod manual_queue;

pub use channel_queue::{ChannelQueue, QueueWorker};
pub use manual_queue::ManualQueue;
