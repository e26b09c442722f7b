//! pledge-core
//!
//! Deferred values settled exactly once, with chained continuations.
//!
//! # Modules
//! - **domain**: ids, states, errors, payload bounds
//! - **ports**: abstractions the core depends on (TaskQueue, Thenable)
//! - **promise**: settlement, the resolution procedure, `then`, combinators
//! - **scheduler**: the handle promises submit deferred work through
//! - **impls**: task queue implementations (ManualQueue, ChannelQueue)
//! - **config**: queue settings
//!
//! ```ignore
//! let queue = Arc::new(ManualQueue::new());
//! let scheduler = Scheduler::new(queue.clone());
//!
//! let doubled = Promise::<i32>::fulfilled(&scheduler, 21).map(|v| v * 2);
//! queue.run_until_idle()?;
//! assert_eq!(doubled.value(), Some(42));
//! ```

pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod promise;
pub mod scheduler;

mod sync;

pub use config::{ConfigError, QueueConfig};
pub use domain::{FailureKind, PromiseError, PromiseId, PromiseStatus, Reason, State, Value};
pub use impls::{ChannelQueue, ManualQueue, QueueWorker};
pub use ports::{FnThenable, Job, Lookup, QueueError, TaskQueue, ThenHook, Thenable};
pub use promise::{
    Deferred, HandlerResult, OnFulfilled, OnRejected, Promise, Resolvable, Resolver, Settled,
};
pub use scheduler::Scheduler;
