//! Coalescing task queue feeding a single execution slot.
//!
//! [`TaskQueue`] is an explicit double-ended queue with a fixed policy:
//!
//! - Tasks are always dispatched from the **tail** (LIFO), see [`TaskQueue::take_next`].
//! - A *coalescing* task first removes every queued task it supersedes, then
//!   is pushed onto the tail, so it is dispatched next.
//! - Any other task is pushed onto the **front**, where it is dispatched only
//!   after everything queued before it.
//!
//! The queue itself never executes anything. The owner pops a task when its
//! execution slot is idle and hands it to a worker.
//!
//! # Example
//!
//! ```
//! use multiselect_core::{QueuedTask, TaskQueue};
//!
//! #[derive(Debug, PartialEq)]
//! struct Search(&'static str);
//!
//! impl QueuedTask for Search {
//!     fn coalesces(&self) -> bool {
//!         true
//!     }
//!
//!     fn supersedes(&self, _queued: &Self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut queue = TaskQueue::new();
//! queue.submit(Search("a"));
//! queue.submit(Search("ab"));
//!
//! assert_eq!(queue.len(), 1);
//! assert_eq!(queue.take_next().map(|(_, task)| task), Some(Search("ab")));
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::targets;

/// A unique identifier for a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// Queueing policy of a task type.
pub trait QueuedTask {
    /// Whether this task goes to the dispatch end of the queue and replaces
    /// the queued tasks it supersedes.
    fn coalesces(&self) -> bool;

    /// Whether this task makes the not-yet-dispatched `queued` task obsolete.
    ///
    /// Only consulted when [`coalesces`](Self::coalesces) returns `true`.
    fn supersedes(&self, queued: &Self) -> bool;
}

/// Outcome of [`TaskQueue::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// The ID assigned to the submitted task.
    pub id: TaskId,
    /// IDs of queued tasks dropped because the new task supersedes them.
    pub superseded: Vec<TaskId>,
}

/// Pending tasks waiting for the execution slot.
pub struct TaskQueue<T> {
    tasks: VecDeque<(TaskId, T)>,
}

impl<T> TaskQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Push a task onto the front of the queue (dispatched last).
    pub fn push_front(&mut self, task: T) -> TaskId {
        let id = next_task_id();
        self.tasks.push_front((id, task));
        id
    }

    /// Push a task onto the tail of the queue (dispatched next).
    pub fn push_back(&mut self, task: T) -> TaskId {
        let id = next_task_id();
        self.tasks.push_back((id, task));
        id
    }

    /// Remove and return the task at the tail of the queue.
    pub fn take_next(&mut self) -> Option<(TaskId, T)> {
        self.tasks.pop_back()
    }

    /// Peek at the task that would be dispatched next.
    pub fn peek(&self) -> Option<&T> {
        self.tasks.back().map(|(_, task)| task)
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and removed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|(task_id, _)| *task_id == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Remove every queued task matching `predicate`.
    ///
    /// Returns the number of removed tasks.
    pub fn discard<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.tasks.len();
        self.tasks.retain(|(_, task)| !predicate(task));
        before - self.tasks.len()
    }

    /// Remove every queued task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Get the number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate over pending tasks from front to tail (reverse dispatch order).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tasks.iter().map(|(_, task)| task)
    }
}

impl<T: QueuedTask> TaskQueue<T> {
    /// Queue a task according to its [`QueuedTask`] policy.
    #[tracing::instrument(skip_all, target = "multiselect_core::task", level = "trace")]
    pub fn submit(&mut self, task: T) -> Submitted {
        if !task.coalesces() {
            let id = self.push_front(task);
            tracing::trace!(target: targets::TASK, id = id.as_u64(), "queued at front");
            return Submitted {
                id,
                superseded: Vec::new(),
            };
        }

        let mut superseded = Vec::new();
        self.tasks.retain(|(queued_id, queued)| {
            let stale = task.supersedes(queued);
            if stale {
                superseded.push(*queued_id);
            }
            !stale
        });

        let id = self.push_back(task);
        if !superseded.is_empty() {
            tracing::debug!(
                target: targets::TASK,
                id = id.as_u64(),
                superseded = superseded.len(),
                "coalesced queued tasks"
            );
        }
        Submitted { id, superseded }
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
