//! Signal/slot notifications for QuickList.
//!
//! A [`Signal<Args>`] holds any number of connected slots (closures). Emitting
//! the signal invokes every slot, in connection order, with a reference to the
//! arguments. Adapters use signals to tell the host surface which rows were
//! inserted, removed, moved or changed, and text inputs use them to report
//! edits.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type
//! - [`ConnectionId`] - Returned by [`Signal::connect`], used to disconnect
//!
//! # Re-entrancy
//!
//! Slots are snapshotted before invocation and the connection table is not
//! locked while they run. A slot may therefore connect, disconnect or emit on
//! the same signal; changes take effect from the next emission.
//!
//! # Example
//!
//! ```
//! use quicklist_core::Signal;
//!
//! let rows_inserted = Signal::<(usize, usize)>::new();
//!
//! let id = rows_inserted.connect(|(position, count)| {
//!     println!("{count} row(s) inserted at {position}");
//! });
//!
//! rows_inserted.emit((0, 3));
//! rows_inserted.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Remains valid until [`Signal::disconnect`] is called with it or the
    /// signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// `Args` is the argument type passed to slots. Use `()` for signals without
/// arguments and a tuple for several values.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(skip_all, target = "quicklist_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
