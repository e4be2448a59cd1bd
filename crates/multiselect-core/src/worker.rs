//! Dedicated background thread with message-passing in both directions.
//!
//! A [`Worker`] owns one named thread that processes requests sequentially.
//! Requests travel to the thread over a bounded channel; the handler answers
//! through an [`Outbox`], which may post any number of responses per request.
//! The owning thread drains responses whenever it is ready to apply them.
//!
//! Nothing is shared between the owner and the worker thread except the
//! channels: requests and responses are moved across the boundary.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use multiselect_core::worker::{Outbox, WorkerBuilder};
//!
//! let worker = WorkerBuilder::new()
//!     .name("word-counter")
//!     .spawn(|text: String, outbox: &Outbox<usize>| {
//!         outbox.post(text.split_whitespace().count());
//!     })
//!     .expect("spawn worker");
//!
//! worker.send("one two three".to_string()).expect("send");
//! assert_eq!(worker.recv_timeout(Duration::from_secs(1)), Some(3));
//!
//! worker.stop_and_join();
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, unbounded};
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::logging::targets;

/// Default capacity for the worker's request queue.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Thread and queue settings of a [`Worker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Thread name, also used in errors and logs.
    pub name: String,
    /// Thread stack size in bytes; the platform default when `None`.
    pub stack_size: Option<usize>,
    /// Capacity of the request queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "multiselect-worker".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Default settings with a custom thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Fluent construction of a [`Worker`].
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Starts from [`WorkerConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Thread stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Maximum number of requests waiting for the thread.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Spawn the worker thread with `handler` processing every request.
    pub fn spawn<Req, Resp, H>(self, handler: H) -> Result<Worker<Req, Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        H: FnMut(Req, &Outbox<Resp>) + Send + 'static,
    {
        Worker::spawn(self.config, handler)
    }
}

/// Sending half handed to the request handler on the worker thread.
pub struct Outbox<Resp> {
    sender: Sender<Resp>,
}

impl<Resp> Outbox<Resp> {
    /// Post a response back to the owner.
    ///
    /// Returns `false` if the owner has dropped the worker.
    pub fn post(&self, response: Resp) -> bool {
        self.sender.send(response).is_ok()
    }
}

/// A request the worker did not accept, handed back with the reason.
pub struct Rejected<Req> {
    /// Why the request was refused.
    pub error: CoreError,
    /// The request, untouched.
    pub request: Req,
}

impl<Req> fmt::Debug for Rejected<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<Req> From<Rejected<Req>> for CoreError {
    fn from(rejected: Rejected<Req>) -> Self {
        rejected.error
    }
}

/// Counters shared by the handle and its thread.
struct WorkerState {
    running: AtomicBool,
    pending: AtomicUsize,
    processed: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            pending: AtomicUsize::new(0),
            processed: AtomicU64::new(0),
        }
    }
}

/// Marks the worker as stopped when the thread exits, including by panic.
struct ExitGuard(Arc<WorkerState>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// A dedicated worker thread with its own request queue.
///
/// # Type Parameters
///
/// - `Req`: requests sent to the worker thread.
/// - `Resp`: responses posted back by the handler.
pub struct Worker<Req: Send + 'static, Resp: Send + 'static> {
    name: String,
    capacity: usize,
    request_sender: Sender<Req>,
    shutdown_sender: Sender<()>,
    response_receiver: Receiver<Resp>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<WorkerState>,
}

impl<Req: Send + 'static, Resp: Send + 'static> Worker<Req, Resp> {
    /// Spawn a worker thread with the given configuration.
    pub fn spawn<H>(config: WorkerConfig, handler: H) -> Result<Self>
    where
        H: FnMut(Req, &Outbox<Resp>) + Send + 'static,
    {
        if config.name.contains('\0') {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "thread name contains a NUL byte");
            return Err(CoreError::spawn(config.name, err));
        }

        let capacity = config.queue_capacity.max(1);
        let (request_sender, request_receiver) = bounded(capacity);
        let (response_sender, response_receiver) = unbounded();
        let (shutdown_sender, shutdown_receiver) = bounded(1);
        let state = Arc::new(WorkerState::new());

        let thread_state = state.clone();
        let outbox = Outbox {
            sender: response_sender,
        };

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                let _exit = ExitGuard(thread_state.clone());
                worker_loop(request_receiver, shutdown_receiver, outbox, &thread_state, handler);
            })
            .map_err(|err| CoreError::spawn(config.name.clone(), err))?;

        tracing::debug!(target: targets::WORKER, name = %config.name, capacity, "worker spawned");

        Ok(Self {
            name: config.name,
            capacity,
            request_sender,
            shutdown_sender,
            response_receiver,
            handle: Mutex::new(Some(handle)),
            state,
        })
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the thread still accepts requests.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Get the number of requests sent but not yet fully processed.
    pub fn pending_requests(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Get the number of requests the handler has finished.
    pub fn processed_requests(&self) -> u64 {
        self.state.processed.load(Ordering::Acquire)
    }

    /// Send a request to the worker thread.
    ///
    /// On failure the request comes back inside [`Rejected`].
    pub fn send(&self, request: Req) -> std::result::Result<(), Rejected<Req>> {
        if !self.is_running() {
            return Err(Rejected {
                error: CoreError::WorkerStopped(self.name.clone()),
                request,
            });
        }

        self.state.pending.fetch_add(1, Ordering::AcqRel);
        let (request, error) = match self.request_sender.try_send(request) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(request)) => (
                request,
                CoreError::QueueFull {
                    name: self.name.clone(),
                    capacity: self.capacity,
                },
            ),
            Err(TrySendError::Disconnected(request)) => {
                (request, CoreError::WorkerStopped(self.name.clone()))
            }
        };
        self.state.pending.fetch_sub(1, Ordering::AcqRel);
        Err(Rejected { error, request })
    }

    /// Take the next available response without blocking.
    pub fn try_recv(&self) -> Option<Resp> {
        self.response_receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Resp> {
        self.response_receiver.recv_timeout(timeout).ok()
    }

    /// Iterate over the responses available right now.
    pub fn try_iter(&self) -> impl Iterator<Item = Resp> + '_ {
        self.response_receiver.try_iter()
    }

    /// Request the worker to stop after processing already-sent requests.
    ///
    /// This is a non-blocking call. No new requests are accepted afterwards.
    pub fn stop(&self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: targets::WORKER, name = %self.name, "worker stopping");
        }
        let _ = self.shutdown_sender.try_send(());
    }

    /// Blocks until the thread exits.
    ///
    /// Returns `false` when it was joined before or ended in a panic.
    pub fn join(&self) -> bool {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle.join().is_ok(),
            None => false,
        }
    }

    /// [`stop`](Self::stop) followed by [`join`](Self::join).
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Drop for Worker<Req, Resp> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<Req, Resp, H>(
    requests: Receiver<Req>,
    shutdown: Receiver<()>,
    outbox: Outbox<Resp>,
    state: &WorkerState,
    mut handler: H,
) where
    H: FnMut(Req, &Outbox<Resp>),
{
    let mut run = |request: Req| {
        handler(request, &outbox);
        state.pending.fetch_sub(1, Ordering::AcqRel);
        state.processed.fetch_add(1, Ordering::AcqRel);
    };

    loop {
        select! {
            recv(requests) -> request => match request {
                Ok(request) => run(request),
                Err(_) => break,
            },
            recv(shutdown) -> _ => {
                // Requests sent before stop() are still answered
                for request in requests.try_iter() {
                    run(request);
                }
                break;
            }
        }
    }
    tracing::trace!(target: targets::WORKER, "worker loop exited");
}

static_assertions::assert_impl_all!(Worker<String, String>: Send, Sync);
