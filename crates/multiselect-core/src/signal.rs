//! Signal/slot notifications for palette state changes.
//!
//! A [`Signal`] holds any number of connected slots (closures). Emitting the
//! signal invokes every slot synchronously on the emitting thread, which is
//! the palette's UI thread. The palette uses signals for the host change
//! notification and for derived-state updates such as button states.
//!
//! # Example
//!
//! ```
//! use multiselect_core::Signal;
//!
//! let changed = Signal::<Vec<String>>::new();
//! let id = changed.connect(|values| {
//!     println!("selection is now {:?}", values);
//! });
//!
//! changed.emit(vec!["red".to_string()]);
//! changed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one listener, accepted by [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A notification source with any number of listeners.
///
/// `Args` is the payload handed to each listener by reference.
///
/// Listeners run in connection order. The connection table is not locked
/// while they run, so a listener may connect or disconnect on the same signal.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Creates a signal without listeners.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Adds a listener and returns its handle.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Adds a listener that lives as long as the returned guard.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_, Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard { signal: self, id }
    }

    /// Removes one listener. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Removes every listener.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of listeners.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Suppresses (or resumes) emission. A blocked signal drops its payloads.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Whether emission is suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Calls every listener with `args`.
    #[tracing::instrument(skip_all, target = "multiselect_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "blocked, payload dropped");
            return;
        }

        let listeners: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, listeners = listeners.len(), "emit");

        for listener in &listeners {
            listener(&args);
        }
    }
}

/// Disconnects its listener on drop. Returned by [`Signal::connect_scoped`].
pub struct ConnectionGuard<'a, Args: 'static> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<'_, Args> {
    /// Handle of the guarded listener.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: 'static> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

static_assertions::assert_impl_all!(Signal<Vec<String>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder(signal: &Signal<String>) -> (ConnectionId, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = signal.connect(move |value: &String| sink.lock().push(value.clone()));
        (id, seen)
    }

    #[test]
    fn test_listeners_run_in_connection_order() {
        let signal = Signal::<String>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for listener in ["first", "second"] {
            let order = order.clone();
            signal.connect(move |value: &String| order.lock().push(format!("{listener}:{value}")));
        }

        signal.emit("red".into());
        assert_eq!(*order.lock(), vec!["first:red", "second:red"]);
    }

    #[test]
    fn test_disconnected_listener_stops_receiving() {
        let signal = Signal::<String>::new();
        let (id, seen) = recorder(&signal);

        signal.emit("a".into());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit("b".into());

        assert_eq!(*seen.lock(), vec!["a"]);
    }

    #[test]
    fn test_blocked_signal_drops_payloads() {
        let signal = Signal::<String>::new();
        let (_, seen) = recorder(&signal);

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit("hidden".into());
        signal.set_blocked(false);
        signal.emit("shown".into());

        assert_eq!(*seen.lock(), vec!["shown"]);
    }

    #[test]
    fn test_scoped_connection_ends_with_guard() {
        let signal = Signal::<u8>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let guard = {
            let calls = calls.clone();
            signal.connect_scoped(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        signal.emit(1);
        assert_eq!(signal.connection_count(), 1);
        assert_eq!(signal.connections.lock().keys().next(), Some(guard.id()));
        drop(guard);

        signal.emit(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_listener_may_disconnect_all_while_emitting() {
        let signal = Arc::new(Signal::<()>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let signal_ref = signal.clone();
            let calls = calls.clone();
            signal.connect(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                signal_ref.disconnect_all();
            });
        }

        signal.emit(());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        signal.emit(());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(signal.connection_count(), 0);
    }
}
