//! The list adapter: an ordered collection of listables and its operations.
//!
//! `ListableAdapter<T, V>` owns the items shown in a list. `T` is the item
//! type (usually an enum over the item kinds of a screen) and `V` is the host's
//! row view type. The host never mutates the items directly; every change goes
//! through an adapter operation, which updates the collection and then emits
//! the matching [`ListSignals`] notifications.
//!
//! # Example
//!
//! ```
//! use quicklist::{EditOp, ListableAdapter, ListableType, QuickFormInputElement, RowView};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! struct Row;
//! impl RowView for Row {}
//!
//! const FORM: ListableType = quicklist::QUICK_FORM_INPUT;
//!
//! let adapter = ListableAdapter::<QuickFormInputElement, Row>::builder(FORM)
//!     .with_listables([QuickFormInputElement::new("first", "firstname")])
//!     .build()
//!     .unwrap();
//!
//! let updates = Arc::new(Mutex::new(Vec::new()));
//! let recv = updates.clone();
//! adapter.signals().connect_updates(move |op| recv.lock().push(op));
//!
//! adapter.add(QuickFormInputElement::new("last", "lastname")).unwrap();
//! assert_eq!(
//!     *updates.lock(),
//!     vec![EditOp::Insert { position: 1, count: 1 }]
//! );
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use quicklist_core::ThreadAffinity;
use quicklist_core::logging::targets;

use crate::binding::{BoundRows, RecyclePool, RowView, ViewTemplate};
use crate::diff::{EditOp, diff};
use crate::error::{Error, Result};
use crate::input::InputValue;
use crate::listable::{Listable, ListableId, ListableType};
use crate::signals::ListSignals;

/// Host callback that renders an item into a row view.
/// Args: (item, view, position)
pub type BindingListener<T, V> = Arc<dyn Fn(&T, &mut V, usize) + Send + Sync>;

/// Host callback invoked when a row is activated.
/// Args: (item, view, position)
pub type ClickListener<T, V> = Arc<dyn Fn(&T, &V, usize) + Send + Sync>;

/// Host callback invoked when a custom-tagged field of a row is edited.
/// Args: (item, position, edited value)
pub type InputChangeListener<T> = Arc<dyn Fn(&T, usize, InputValue) + Send + Sync>;

/// Tag of a row's primary editable field unless configured otherwise.
pub const DEFAULT_PRIMARY_INPUT_TAG: &str = "input";

/// Number of idle views kept per listable type unless configured otherwise.
pub const DEFAULT_MAX_RECYCLED_VIEWS: usize = 5;

/// State shared between adapter handles and the input bridge closures.
pub(crate) struct Shared<T, V> {
    pub(crate) items: RwLock<Vec<T>>,
    pub(crate) default_type: ListableType,
    pub(crate) templates: RwLock<HashMap<ListableType, ViewTemplate<V>>>,
    pub(crate) pool: Mutex<RecyclePool<V>>,
    pub(crate) bound_rows: BoundRows,
    pub(crate) binding_listener: Option<BindingListener<T, V>>,
    pub(crate) clicked_listener: Option<ClickListener<T, V>>,
    pub(crate) input_change_listener: Option<InputChangeListener<T>>,
    pub(crate) input_tags: Vec<String>,
    pub(crate) primary_input_tag: String,
    pub(crate) recyclable: AtomicBool,
    pub(crate) signals: ListSignals,
    pub(crate) affinity: ThreadAffinity,
}

/// A data-bound adapter for heterogeneous lists.
///
/// Cloning the adapter clones the handle; all clones share one collection.
/// The adapter belongs to the thread that built it and debug builds assert
/// that mutations happen there.
///
/// Callbacks and signal slots run without any adapter lock held, so they may
/// call back into the adapter.
pub struct ListableAdapter<T, V> {
    pub(crate) shared: Arc<Shared<T, V>>,
}

impl<T, V> Clone for ListableAdapter<T, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Listable + std::fmt::Debug, V> std::fmt::Debug for ListableAdapter<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListableAdapter")
            .field("default_type", &self.shared.default_type)
            .field("listables", &*self.shared.items.read())
            .field("input_tags", &self.shared.input_tags)
            .field("recyclable", &self.shared.recyclable.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Builder for [`ListableAdapter`].
///
/// Only the default type is required. Rows are recyclable, the primary input
/// tag is `"input"` and up to five idle views are kept per type unless
/// configured otherwise.
pub struct AdapterBuilder<T, V> {
    default_type: ListableType,
    listables: Vec<T>,
    templates: HashMap<ListableType, ViewTemplate<V>>,
    binding_listener: Option<BindingListener<T, V>>,
    clicked_listener: Option<ClickListener<T, V>>,
    input_change_listener: Option<InputChangeListener<T>>,
    input_tags: Vec<String>,
    primary_input_tag: String,
    recyclable: bool,
    max_recycled_views: usize,
}

impl<T: Listable, V: RowView> AdapterBuilder<T, V> {
    fn new(default_type: ListableType) -> Self {
        Self {
            default_type,
            listables: Vec::new(),
            templates: HashMap::new(),
            binding_listener: None,
            clicked_listener: None,
            input_change_listener: None,
            input_tags: Vec::new(),
            primary_input_tag: DEFAULT_PRIMARY_INPUT_TAG.to_owned(),
            recyclable: true,
            max_recycled_views: DEFAULT_MAX_RECYCLED_VIEWS,
        }
    }

    /// Sets the initial items.
    pub fn with_listables(mut self, listables: impl IntoIterator<Item = T>) -> Self {
        self.listables = listables.into_iter().collect();
        self
    }

    /// Sets the binding callback.
    pub fn on_bind<F>(mut self, listener: F) -> Self
    where
        F: Fn(&T, &mut V, usize) + Send + Sync + 'static,
    {
        self.binding_listener = Some(Arc::new(listener));
        self
    }

    /// Sets the row activation callback.
    pub fn on_click<F>(mut self, listener: F) -> Self
    where
        F: Fn(&T, &V, usize) + Send + Sync + 'static,
    {
        self.clicked_listener = Some(Arc::new(listener));
        self
    }

    /// Sets the callback for edits of custom-tagged fields.
    pub fn on_input_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&T, usize, InputValue) + Send + Sync + 'static,
    {
        self.input_change_listener = Some(Arc::new(listener));
        self
    }

    /// Declares the tags of custom editable fields.
    pub fn with_input_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the tag of each row's primary editable field.
    pub fn with_primary_input_tag(mut self, tag: impl Into<String>) -> Self {
        self.primary_input_tag = tag.into();
        self
    }

    /// Sets whether bound rows may be reclaimed for reuse.
    pub fn with_recyclable(mut self, recyclable: bool) -> Self {
        self.recyclable = recyclable;
        self
    }

    /// Sets how many idle views are kept per listable type.
    pub fn with_max_recycled_views(mut self, max: usize) -> Self {
        self.max_recycled_views = max;
        self
    }

    /// Registers the view template used for `listable_type`.
    pub fn with_template<F>(mut self, listable_type: ListableType, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.templates.insert(listable_type, Arc::new(factory));
        self
    }

    /// Builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateIdentifier`] if two initial items share an
    /// identifier.
    pub fn build(self) -> Result<ListableAdapter<T, V>> {
        ensure_unique(&[], &self.listables, None).map_err(|error| rejected("build", error))?;

        tracing::debug!(
            target: targets::ADAPTER,
            default_type = %self.default_type,
            len = self.listables.len(),
            "adapter built"
        );

        Ok(ListableAdapter {
            shared: Arc::new(Shared {
                items: RwLock::new(self.listables),
                default_type: self.default_type,
                templates: RwLock::new(self.templates),
                pool: Mutex::new(RecyclePool::new(self.max_recycled_views)),
                bound_rows: BoundRows::default(),
                binding_listener: self.binding_listener,
                clicked_listener: self.clicked_listener,
                input_change_listener: self.input_change_listener,
                input_tags: self.input_tags,
                primary_input_tag: self.primary_input_tag,
                recyclable: AtomicBool::new(self.recyclable),
                signals: ListSignals::new(),
                affinity: ThreadAffinity::current(),
            }),
        })
    }
}

impl<T: Listable, V: RowView> ListableAdapter<T, V> {
    /// Starts building an adapter whose untyped items use `default_type`.
    pub fn builder(default_type: ListableType) -> AdapterBuilder<T, V> {
        AdapterBuilder::new(default_type)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The signals notifying the host of collection changes.
    pub fn signals(&self) -> &ListSignals {
        &self.shared.signals
    }

    /// The type used for items without their own type.
    pub fn default_type(&self) -> ListableType {
        self.shared.default_type
    }

    /// Tags of custom editable fields.
    pub fn input_tags(&self) -> &[String] {
        &self.shared.input_tags
    }

    /// Tag of each row's primary editable field.
    pub fn primary_input_tag(&self) -> &str {
        &self.shared.primary_input_tag
    }

    /// Whether rows bound from now on may be reclaimed for reuse.
    pub fn is_recyclable(&self) -> bool {
        self.shared.recyclable.load(Ordering::SeqCst)
    }

    /// Changes the recycling flag. Takes effect on the next bind of each row.
    pub fn set_recyclable(&self, recyclable: bool) {
        self.shared.recyclable.store(recyclable, Ordering::SeqCst);
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.shared.items.read().len()
    }

    /// Returns `true` if the adapter holds no items.
    pub fn is_empty(&self) -> bool {
        self.shared.items.read().is_empty()
    }

    /// A copy of the item at `position`.
    pub fn item(&self, position: usize) -> Result<T> {
        let items = self.shared.items.read();
        items
            .get(position)
            .cloned()
            .ok_or_else(|| Error::out_of_bounds(position, items.len()))
    }

    /// A snapshot of all items in display order.
    pub fn listables(&self) -> Vec<T> {
        self.shared.items.read().clone()
    }

    /// Runs `f` on a snapshot of the items.
    ///
    /// No lock is held while `f` runs, so it may edit bound fields or call
    /// other adapter operations; it keeps seeing the items as they were.
    pub fn with_listables<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.listables();
        f(&items)
    }

    /// Position of the item with `identifier`, if present.
    pub fn position_of(&self, identifier: &ListableId) -> Option<usize> {
        self.shared
            .items
            .read()
            .iter()
            .position(|item| item.identifier() == *identifier)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Replaces the whole collection, notifying the host of the minimal edit
    /// script between the old and new items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateIdentifier`] if `listables` repeats an
    /// identifier.
    pub fn set_listables(&self, listables: Vec<T>) -> Result<()> {
        self.shared.affinity.debug_assert_same_thread();

        let script = {
            let mut items = self.shared.items.write();
            let script = diff(items.as_slice(), &listables)
                .map_err(|error| rejected("set_listables", error))?;
            *items = listables;
            for op in &script {
                self.shared.bound_rows.apply(*op);
            }
            script
        };

        tracing::debug!(target: targets::ADAPTER, ops = script.len(), "listables replaced");
        self.shared.signals.emit_script(&script);
        Ok(())
    }

    /// Appends `item`.
    pub fn add(&self, item: T) -> Result<()> {
        self.shared.affinity.debug_assert_same_thread();

        let position = {
            let mut items = self.shared.items.write();
            ensure_unique(items.as_slice(), std::slice::from_ref(&item), None)
                .map_err(|error| rejected("add", error))?;
            items.push(item);
            items.len() - 1
        };

        tracing::debug!(target: targets::ADAPTER, position, "item added");
        self.shared
            .signals
            .emit_op(EditOp::Insert { position, count: 1 });
        Ok(())
    }

    /// Appends every item of `listables` that is not already in the list.
    ///
    /// Items equal (by content) to an item already present are skipped.
    /// Returns the number of items appended.
    pub fn add_all(&self, listables: Vec<T>) -> Result<usize> {
        self.shared.affinity.debug_assert_same_thread();

        let mut incoming = listables;
        let (position, count) = {
            let mut items = self.shared.items.write();
            incoming.retain(|item| !items.contains(item));
            ensure_unique(items.as_slice(), &incoming, None)
                .map_err(|error| rejected("add_all", error))?;
            let position = items.len();
            let count = incoming.len();
            items.extend(incoming);
            (position, count)
        };

        tracing::debug!(target: targets::ADAPTER, position, count, "items added");
        self.shared
            .signals
            .emit_op(EditOp::Insert { position, count });
        Ok(count)
    }

    /// Inserts `item` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `position > len()`.
    pub fn add_at(&self, position: usize, item: T) -> Result<()> {
        self.add_all_at(position, vec![item])
    }

    /// Inserts `listables` at `position`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `position > len()`.
    pub fn add_all_at(&self, position: usize, listables: Vec<T>) -> Result<()> {
        self.shared.affinity.debug_assert_same_thread();

        let count = listables.len();
        {
            let mut items = self.shared.items.write();
            if position > items.len() {
                return Err(rejected(
                    "add_at",
                    Error::out_of_bounds(position, items.len()),
                ));
            }
            ensure_unique(items.as_slice(), &listables, None)
                .map_err(|error| rejected("add_at", error))?;
            items.splice(position..position, listables);
            self.shared
                .bound_rows
                .apply(EditOp::Insert { position, count });
        }

        tracing::debug!(target: targets::ADAPTER, position, count, "items inserted");
        self.shared
            .signals
            .emit_op(EditOp::Insert { position, count });
        Ok(())
    }

    /// Removes and returns the item at `position`.
    ///
    /// Rows after `position` shift up and are reported as changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `position >= len()`.
    pub fn remove_at(&self, position: usize) -> Result<T> {
        self.shared.affinity.debug_assert_same_thread();

        let (removed, len) = {
            let mut items = self.shared.items.write();
            if position >= items.len() {
                return Err(rejected(
                    "remove_at",
                    Error::out_of_bounds(position, items.len()),
                ));
            }
            let removed = items.remove(position);
            self.shared
                .bound_rows
                .apply(EditOp::Remove { position, count: 1 });
            (removed, items.len())
        };

        tracing::debug!(target: targets::ADAPTER, position, "item removed");
        let signals = &self.shared.signals;
        signals.emit_op(EditOp::Remove { position, count: 1 });
        signals.emit_op(EditOp::Change {
            position,
            count: len - position,
        });
        Ok(removed)
    }

    /// Replaces the item at `position`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `position >= len()`, or
    /// [`Error::DuplicateIdentifier`] if another row already uses the new
    /// item's identifier.
    pub fn replace_at(&self, position: usize, item: T) -> Result<T> {
        self.shared.affinity.debug_assert_same_thread();

        let previous = {
            let mut items = self.shared.items.write();
            if position >= items.len() {
                return Err(rejected(
                    "replace_at",
                    Error::out_of_bounds(position, items.len()),
                ));
            }
            ensure_unique(items.as_slice(), std::slice::from_ref(&item), Some(position))
                .map_err(|error| rejected("replace_at", error))?;
            std::mem::replace(&mut items[position], item)
        };

        tracing::debug!(target: targets::ADAPTER, position, "item replaced");
        self.shared
            .signals
            .emit_op(EditOp::Change { position, count: 1 });
        Ok(previous)
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.shared.affinity.debug_assert_same_thread();

        let count = {
            let mut items = self.shared.items.write();
            let count = items.len();
            items.clear();
            self.shared
                .bound_rows
                .apply(EditOp::Remove { position: 0, count });
            count
        };

        tracing::debug!(target: targets::ADAPTER, count, "listables cleared");
        self.shared.signals.emit_op(EditOp::Remove { position: 0, count });
    }
}

/// Checks that `incoming` adds no identifier already used by `existing`
/// (ignoring the row at `replaced`) or repeated within itself.
fn ensure_unique<T: Listable>(
    existing: &[T],
    incoming: &[T],
    replaced: Option<usize>,
) -> Result<()> {
    let mut seen: HashSet<ListableId> = existing
        .iter()
        .enumerate()
        .filter(|(position, _)| Some(*position) != replaced)
        .map(|(_, item)| item.identifier())
        .collect();

    for item in incoming {
        let identifier = item.identifier();
        if seen.contains(&identifier) {
            return Err(Error::duplicate(identifier));
        }
        seen.insert(identifier);
    }
    Ok(())
}

fn rejected(operation: &'static str, error: Error) -> Error {
    tracing::warn!(target: targets::ADAPTER, operation, %error, "operation rejected");
    error
}

static_assertions::assert_impl_all!(
    ListableAdapter<crate::QuickFormInputElement, ()>: Send, Sync, Clone
);
