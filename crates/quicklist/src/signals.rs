//! Change notifications emitted by list adapters.
//!
//! The host surface connects to [`ListSignals`] to learn which rows it has to
//! insert, remove, move or re-bind. Every adapter operation emits the smallest
//! set of notifications that describes it; there is no whole-list refresh.

use std::sync::Arc;

use quicklist_core::{ConnectionId, Signal};

use crate::diff::{EditOp, EditScript};

/// Collection of signals emitted by a [`ListableAdapter`](crate::ListableAdapter).
///
/// Positions are always relative to the list as it is at the moment the
/// signal fires, so a host replaying them in order stays in sync.
pub struct ListSignals {
    /// Rows were inserted.
    /// Args: (first position, count)
    pub items_inserted: Signal<(usize, usize)>,

    /// Rows were removed.
    /// Args: (first position, count)
    pub items_removed: Signal<(usize, usize)>,

    /// A row was moved.
    /// Args: (from, to), with `to` counted after the row was taken out
    pub item_moved: Signal<(usize, usize)>,

    /// Rows must be re-bound.
    /// Args: (first position, count)
    pub items_changed: Signal<(usize, usize)>,
}

impl Default for ListSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSignals")
            .field("items_inserted", &self.items_inserted)
            .field("items_removed", &self.items_removed)
            .field("item_moved", &self.item_moved)
            .field("items_changed", &self.items_changed)
            .finish()
    }
}

impl ListSignals {
    /// Creates a new set of list signals.
    pub fn new() -> Self {
        Self {
            items_inserted: Signal::new(),
            items_removed: Signal::new(),
            item_moved: Signal::new(),
            items_changed: Signal::new(),
        }
    }

    /// Connects one slot to all four signals, receiving each notification as
    /// an [`EditOp`].
    ///
    /// Returns the connection ids in the order inserted, removed, moved,
    /// changed.
    pub fn connect_updates<F>(&self, slot: F) -> [ConnectionId; 4]
    where
        F: Fn(EditOp) + Send + Sync + 'static,
    {
        let slot = Arc::new(slot);

        let inserted = slot.clone();
        let removed = slot.clone();
        let moved = slot.clone();
        let changed = slot;
        [
            self.items_inserted.connect(move |&(position, count)| {
                inserted(EditOp::Insert { position, count })
            }),
            self.items_removed.connect(move |&(position, count)| {
                removed(EditOp::Remove { position, count })
            }),
            self.item_moved
                .connect(move |&(from, to)| moved(EditOp::Move { from, to })),
            self.items_changed.connect(move |&(position, count)| {
                changed(EditOp::Change { position, count })
            }),
        ]
    }

    /// Emits the notification matching `op`. Empty ranges are not emitted.
    pub fn emit_op(&self, op: EditOp) {
        match op {
            EditOp::Insert { count: 0, .. }
            | EditOp::Remove { count: 0, .. }
            | EditOp::Change { count: 0, .. } => {}
            EditOp::Insert { position, count } => self.items_inserted.emit((position, count)),
            EditOp::Remove { position, count } => self.items_removed.emit((position, count)),
            EditOp::Move { from, to } => self.item_moved.emit((from, to)),
            EditOp::Change { position, count } => self.items_changed.emit((position, count)),
        }
    }

    /// Emits every operation of `script` in order.
    pub fn emit_script(&self, script: &EditScript) {
        for op in script {
            self.emit_op(*op);
        }
    }
}
