//! Core primitives for the multiselect palette.
//!
//! This crate provides the pieces of the palette that know nothing about
//! options or lists:
//!
//! - **Signals**: synchronous signal/slot notifications ([`Signal`])
//! - **Task Queue**: an explicit deque with coalescing and LIFO dispatch ([`TaskQueue`])
//! - **Worker**: one dedicated background thread with typed request and
//!   response channels ([`Worker`])
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Worker + Task Queue Example
//!
//! ```no_run
//! use std::time::Duration;
//! use multiselect_core::{Outbox, QueuedTask, TaskQueue, WorkerBuilder};
//!
//! struct Lookup(String);
//!
//! impl QueuedTask for Lookup {
//!     fn coalesces(&self) -> bool {
//!         true
//!     }
//!
//!     fn supersedes(&self, _queued: &Self) -> bool {
//!         true
//!     }
//! }
//!
//! let worker = WorkerBuilder::new()
//!     .name("lookup")
//!     .spawn(|Lookup(text), outbox: &Outbox<usize>| {
//!         outbox.post(text.len());
//!     })?;
//!
//! let mut queue = TaskQueue::new();
//! queue.submit(Lookup("a".into()));
//! queue.submit(Lookup("abc".into()));
//!
//! while let Some((_, task)) = queue.take_next() {
//!     worker.send(task)?;
//! }
//! assert_eq!(worker.recv_timeout(Duration::from_secs(1)), Some(3));
//! # Ok::<(), multiselect_core::CoreError>(())
//! ```

mod error;
pub mod logging;
pub mod signal;
pub mod task;
pub mod worker;

pub use error::{CoreError, Result};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use task::{QueuedTask, Submitted, TaskId, TaskQueue};
pub use worker::{Outbox, Rejected, Worker, WorkerBuilder, WorkerConfig};
