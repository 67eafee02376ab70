//! View binding and recycling.
//!
//! The adapter hands the host [`ViewHolder`]s: a row view created from the
//! template registered for a listable type, plus the position it currently
//! displays. Views that scroll out of sight go back to a per-type
//! [`RecyclePool`] and are re-bound to other rows of the same type.
//!
//! A host typically drives this with:
//!
//! 1. [`ListableAdapter::item_view_type`] to learn which kind of view a row needs,
//! 2. [`ListableAdapter::obtain_view`] to get a bound holder (recycled or new),
//! 3. [`ListableAdapter::recycle_view`] once the row is no longer visible.
//!
//! Every collection change also moves the positions of live holders, so a
//! holder keeps reporting edits and clicks for the row it shows after rows
//! are inserted, removed or moved around it. A holder whose row is removed
//! becomes unbound until it is bound again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quicklist_core::logging::targets;

use crate::adapter::ListableAdapter;
use crate::diff::EditOp;
use crate::error::{Error, Result};
use crate::input::InputBridge;
use crate::listable::{Listable, ListableType, resolve_type};
use crate::text_input::TextInput;

/// A row view supplied by the host.
///
/// Views expose their editable fields by tag so the adapter can wire edits
/// back to the bound item.
pub trait RowView: Send + 'static {
    /// Returns the editable field tagged `tag`, if the view has one.
    fn find_input(&self, tag: &str) -> Option<Arc<TextInput>> {
        let _ = tag;
        None
    }
}

impl RowView for () {}

/// Factory creating a fresh row view for one listable type.
pub type ViewTemplate<V> = Arc<dyn Fn() -> V + Send + Sync>;

const UNBOUND: usize = usize::MAX;

/// The position a holder displays, shared with its input bridge.
#[derive(Debug)]
pub(crate) struct BoundPosition(AtomicUsize);

impl BoundPosition {
    pub(crate) fn unbound() -> Self {
        Self(AtomicUsize::new(UNBOUND))
    }

    pub(crate) fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::SeqCst) {
            UNBOUND => None,
            position => Some(position),
        }
    }

    pub(crate) fn set(&self, position: Option<usize>) {
        self.0.store(position.unwrap_or(UNBOUND), Ordering::SeqCst);
    }
}

/// Positions of every live holder created by one adapter.
///
/// Mutations call [`BoundRows::apply`] for each edit they make while still
/// holding the item lock, so no edit is ever resolved against a position
/// from before the change.
#[derive(Debug, Default)]
pub(crate) struct BoundRows(Mutex<Vec<Weak<BoundPosition>>>);

impl BoundRows {
    pub(crate) fn track(&self, position: &Arc<BoundPosition>) {
        let mut rows = self.0.lock();
        rows.retain(|row| row.strong_count() > 0);
        rows.push(Arc::downgrade(position));
    }

    /// Moves each bound position to where `op` leaves its row.
    pub(crate) fn apply(&self, op: EditOp) {
        let mut rows = self.0.lock();
        rows.retain(|row| row.strong_count() > 0);
        for row in rows.iter().filter_map(Weak::upgrade) {
            if let Some(position) = row.get() {
                row.set(follow(op, position));
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.lock().len()
    }
}

/// Where the row at `position` ends up after `op`, or `None` if it was removed.
fn follow(op: EditOp, position: usize) -> Option<usize> {
    match op {
        EditOp::Insert { position: at, count } if position >= at => Some(position + count),
        EditOp::Remove { position: at, count } if position >= at => {
            if position < at + count {
                None
            } else {
                Some(position - count)
            }
        }
        EditOp::Move { from, to } => {
            if position == from {
                return Some(to);
            }
            let taken = position - usize::from(position > from);
            Some(taken + usize::from(taken >= to))
        }
        _ => Some(position),
    }
}

/// A row view together with its binding state.
pub struct ViewHolder<V> {
    view: V,
    listable_type: ListableType,
    position: Arc<BoundPosition>,
    recyclable: bool,
    bridge: InputBridge,
}

impl<V> ViewHolder<V> {
    /// The row view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the row view.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// The listable type this holder was created for.
    pub fn listable_type(&self) -> ListableType {
        self.listable_type
    }

    /// The position the holder displays, or `None` while unbound.
    pub fn position(&self) -> Option<usize> {
        self.position.get()
    }

    /// Whether the holder may be returned to the recycle pool.
    pub fn is_recyclable(&self) -> bool {
        self.recyclable
    }

    /// Number of signal connections wiring the view's fields to the adapter.
    pub fn input_connection_count(&self) -> usize {
        self.bridge.connection_count()
    }

    fn unbind(&self) {
        self.position.set(None);
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for ViewHolder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewHolder")
            .field("view", &self.view)
            .field("listable_type", &self.listable_type)
            .field("position", &self.position())
            .field("recyclable", &self.recyclable)
            .finish_non_exhaustive()
    }
}

/// Idle view holders, grouped by listable type.
pub struct RecyclePool<V> {
    scrap: HashMap<ListableType, Vec<ViewHolder<V>>>,
    max_per_type: usize,
}

impl<V> RecyclePool<V> {
    /// Creates a pool keeping at most `max_per_type` holders per type.
    pub fn new(max_per_type: usize) -> Self {
        Self {
            scrap: HashMap::new(),
            max_per_type,
        }
    }

    /// The per-type capacity.
    pub fn max_per_type(&self) -> usize {
        self.max_per_type
    }

    /// Takes an idle holder of `listable_type`, if any.
    pub fn acquire(&mut self, listable_type: ListableType) -> Option<ViewHolder<V>> {
        self.scrap.get_mut(&listable_type)?.pop()
    }

    /// Returns `holder` to the pool, unbinding it.
    ///
    /// Returns `false` and drops the holder if it is not recyclable or the
    /// pool for its type is full.
    pub fn release(&mut self, holder: ViewHolder<V>) -> bool {
        holder.unbind();
        if !holder.is_recyclable() {
            return false;
        }
        let scrap = self.scrap.entry(holder.listable_type).or_default();
        if scrap.len() >= self.max_per_type {
            return false;
        }
        scrap.push(holder);
        true
    }

    /// Number of idle holders of `listable_type`.
    pub fn count(&self, listable_type: ListableType) -> usize {
        self.scrap.get(&listable_type).map_or(0, Vec::len)
    }

    /// Total number of idle holders.
    pub fn len(&self) -> usize {
        self.scrap.values().map(Vec::len).sum()
    }

    /// Returns `true` if no holder is idle.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every idle holder.
    pub fn clear(&mut self) {
        self.scrap.clear();
    }
}

impl<T: Listable, V: RowView> ListableAdapter<T, V> {
    /// Registers the view template used for `listable_type`, replacing any
    /// earlier one. Pooled views of that type are kept.
    pub fn register_template<F>(&self, listable_type: ListableType, factory: F)
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.shared
            .templates
            .write()
            .insert(listable_type, Arc::new(factory));
        tracing::debug!(target: targets::BINDING, %listable_type, "template registered");
    }

    /// Returns `true` if a template is registered for `listable_type`.
    pub fn has_template(&self, listable_type: ListableType) -> bool {
        self.shared.templates.read().contains_key(&listable_type)
    }

    /// The view type of the row at `position`: the item's own type, or the
    /// adapter's default type.
    pub fn item_view_type(&self, position: usize) -> Result<ListableType> {
        let items = self.shared.items.read();
        items
            .get(position)
            .map(|item| resolve_type(item, self.shared.default_type))
            .ok_or_else(|| Error::out_of_bounds(position, items.len()))
    }

    /// Creates an unbound holder from the template of `listable_type` and
    /// wires its editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnregisteredType`] if no template is registered.
    pub fn create_view_holder(&self, listable_type: ListableType) -> Result<ViewHolder<V>> {
        let template = self.shared.templates.read().get(&listable_type).cloned();
        let Some(template) = template else {
            tracing::warn!(
                target: targets::BINDING,
                %listable_type,
                "no template registered"
            );
            return Err(Error::UnregisteredType(listable_type));
        };

        let view = template();
        let position = Arc::new(BoundPosition::unbound());
        self.shared.bound_rows.track(&position);
        let bridge = InputBridge::attach(&self.shared, &view, &position);

        tracing::debug!(
            target: targets::BINDING,
            %listable_type,
            inputs = bridge.connection_count(),
            "view holder created"
        );
        Ok(ViewHolder {
            view,
            listable_type,
            position,
            recyclable: self.is_recyclable(),
            bridge,
        })
    }

    /// Binds `holder` to the item at `position` and runs the binding callback.
    ///
    /// Fields the callback fills in do not report edits back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an invalid position, or
    /// [`Error::TypeMismatch`] if the holder was created for another type.
    pub fn bind_view_holder(&self, holder: &mut ViewHolder<V>, position: usize) -> Result<()> {
        let item = self.item(position)?;
        let expected = resolve_type(&item, self.shared.default_type);
        if expected != holder.listable_type {
            return Err(Error::TypeMismatch {
                expected,
                found: holder.listable_type,
            });
        }

        holder.position.set(Some(position));
        holder.recyclable = self.is_recyclable();

        // Text written into the fields while binding is display, not an edit.
        if let Some(listener) = &self.shared.binding_listener {
            let blocked = holder.bridge.block_text_changes();
            listener(&item, &mut holder.view, position);
            for input in blocked {
                input.text_changed.set_blocked(false);
            }
        }
        tracing::trace!(target: targets::BINDING, position, "view holder bound");
        Ok(())
    }

    /// Returns a holder bound to `position`, reusing an idle one of the right
    /// type when the pool has one.
    pub fn obtain_view(&self, position: usize) -> Result<ViewHolder<V>> {
        let listable_type = self.item_view_type(position)?;
        let recycled = self.shared.pool.lock().acquire(listable_type);
        let mut holder = match recycled {
            Some(holder) => holder,
            None => self.create_view_holder(listable_type)?,
        };
        self.bind_view_holder(&mut holder, position)?;
        Ok(holder)
    }

    /// Hands a holder that is no longer displayed back to the adapter.
    ///
    /// Returns `true` if it was pooled for reuse, `false` if it was dropped.
    /// Either way it stops reporting edits.
    pub fn recycle_view(&self, holder: ViewHolder<V>) -> bool {
        let listable_type = holder.listable_type;
        let pooled = self.shared.pool.lock().release(holder);
        tracing::trace!(target: targets::BINDING, %listable_type, pooled, "view holder released");
        pooled
    }

    /// Number of idle holders of `listable_type` waiting for reuse.
    pub fn recycled_view_count(&self, listable_type: ListableType) -> usize {
        self.shared.pool.lock().count(listable_type)
    }

    /// Reports activation of the row displayed by `holder` to the click
    /// callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundView`] if the holder is unbound, or
    /// [`Error::OutOfBounds`] if its position no longer exists.
    pub fn click(&self, holder: &ViewHolder<V>) -> Result<()> {
        let position = holder.position().ok_or(Error::UnboundView)?;
        let item = self.item(position)?;
        if let Some(listener) = &self.shared.clicked_listener {
            listener(&item, &holder.view, position);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listable::ListableId;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Item {
        Person(u64, String),
        Chair(u64),
    }

    const PERSON: ListableType = ListableType::new("person", 1);
    const CHAIR: ListableType = ListableType::new("chair", 2);

    impl Listable for Item {
        fn identifier(&self) -> ListableId {
            match self {
                Item::Person(id, _) | Item::Chair(id) => (*id).into(),
            }
        }

        fn listable_type(&self) -> Option<ListableType> {
            match self {
                Item::Person(..) => None,
                Item::Chair(_) => Some(CHAIR),
            }
        }
    }

    #[derive(Debug, Default)]
    struct Label {
        serial: usize,
        text: String,
    }

    impl RowView for Label {}

    fn adapter(items: Vec<Item>) -> ListableAdapter<Item, Label> {
        let serial = Arc::new(AtomicUsize::new(0));
        let chairs = serial.clone();
        ListableAdapter::builder(PERSON)
            .with_listables(items)
            .with_template(PERSON, move || Label {
                serial: serial.fetch_add(1, Ordering::SeqCst),
                text: String::new(),
            })
            .with_template(CHAIR, move || Label {
                serial: chairs.fetch_add(1, Ordering::SeqCst),
                text: String::new(),
            })
            .with_max_recycled_views(2)
            .on_bind(|item, view: &mut Label, position| {
                view.text = match item {
                    Item::Person(_, name) => format!("{position}:{name}"),
                    Item::Chair(id) => format!("{position}:chair {id}"),
                };
            })
            .build()
            .unwrap()
    }

    fn people() -> Vec<Item> {
        vec![
            Item::Person(1, "Adwoa".into()),
            Item::Chair(2),
            Item::Person(3, "Kwame".into()),
        ]
    }

    #[test]
    fn test_item_view_type_falls_back_to_default() {
        let adapter = adapter(people());
        assert_eq!(adapter.item_view_type(0), Ok(PERSON));
        assert_eq!(adapter.item_view_type(1), Ok(CHAIR));
        assert_eq!(
            adapter.item_view_type(3),
            Err(Error::OutOfBounds {
                position: 3,
                len: 3
            })
        );
    }

    #[test]
    fn test_obtain_view_binds() {
        let adapter = adapter(people());

        let holder = adapter.obtain_view(2).unwrap();

        assert_eq!(holder.view().text, "2:Kwame");
        assert_eq!(holder.position(), Some(2));
        assert_eq!(holder.listable_type(), PERSON);
        assert!(holder.is_recyclable());
    }

    #[test]
    fn test_create_view_holder_requires_template() {
        let adapter = adapter(vec![]);
        let other = ListableType::new("other", 9);

        assert_eq!(
            adapter.create_view_holder(other).err().map(|e| e.to_string()),
            Some(Error::UnregisteredType(other).to_string())
        );

        adapter.register_template(other, Label::default);
        assert!(adapter.has_template(other));
        let holder = adapter.create_view_holder(other).unwrap();
        assert_eq!(holder.position(), None);
    }

    #[test]
    fn test_bind_rejects_type_mismatch() {
        let adapter = adapter(people());
        let mut holder = adapter.create_view_holder(PERSON).unwrap();

        assert_eq!(
            adapter.bind_view_holder(&mut holder, 1),
            Err(Error::TypeMismatch {
                expected: CHAIR,
                found: PERSON
            })
        );
        assert_eq!(holder.position(), None);
    }

    #[test]
    fn test_recycled_view_is_reused_for_same_type() {
        let adapter = adapter(people());

        let first = adapter.obtain_view(0).unwrap();
        let serial = first.view().serial;
        assert!(adapter.recycle_view(first));
        assert_eq!(adapter.recycled_view_count(PERSON), 1);

        // A chair cannot take the person's view.
        let chair = adapter.obtain_view(1).unwrap();
        assert_ne!(chair.view().serial, serial);
        assert_eq!(adapter.recycled_view_count(PERSON), 1);

        let reused = adapter.obtain_view(2).unwrap();
        assert_eq!(reused.view().serial, serial);
        assert_eq!(reused.view().text, "2:Kwame");
        assert_eq!(adapter.recycled_view_count(PERSON), 0);
    }

    #[test]
    fn test_pool_capacity_is_per_type() {
        let adapter = adapter(people());
        let holders: Vec<_> = (0..3)
            .map(|_| adapter.create_view_holder(PERSON).unwrap())
            .collect();

        let pooled: Vec<bool> = holders
            .into_iter()
            .map(|holder| adapter.recycle_view(holder))
            .collect();

        assert_eq!(pooled, vec![true, true, false]);
        assert_eq!(adapter.recycled_view_count(PERSON), 2);
        assert_eq!(adapter.recycled_view_count(CHAIR), 0);
    }

    #[test]
    fn test_non_recyclable_rows_are_dropped() {
        let adapter = adapter(people());
        adapter.set_recyclable(false);

        let holder = adapter.obtain_view(0).unwrap();
        assert!(!holder.is_recyclable());
        assert!(!adapter.recycle_view(holder));
        assert_eq!(adapter.recycled_view_count(PERSON), 0);
    }

    #[test]
    fn test_rebinding_updates_position() {
        let adapter = adapter(people());
        let mut holder = adapter.obtain_view(0).unwrap();

        adapter.add_at(0, Item::Person(9, "Lee".into())).unwrap();
        assert_eq!(holder.position(), Some(1));
        assert_eq!(holder.view().text, "0:Adwoa");

        adapter.bind_view_holder(&mut holder, 1).unwrap();

        assert_eq!(holder.position(), Some(1));
        assert_eq!(holder.view().text, "1:Adwoa");
    }

    #[test]
    fn test_follow_tracks_row_through_edits() {
        let insert = EditOp::Insert { position: 1, count: 2 };
        assert_eq!(follow(insert, 0), Some(0));
        assert_eq!(follow(insert, 1), Some(3));

        let remove = EditOp::Remove { position: 1, count: 2 };
        assert_eq!(follow(remove, 0), Some(0));
        assert_eq!(follow(remove, 2), None);
        assert_eq!(follow(remove, 3), Some(1));

        // [a, b, c, d] -> [b, c, a, d]
        let forward = EditOp::Move { from: 0, to: 2 };
        assert_eq!(follow(forward, 0), Some(2));
        assert_eq!(follow(forward, 1), Some(0));
        assert_eq!(follow(forward, 3), Some(3));

        // [a, b, c, d] -> [a, d, b, c]
        let backward = EditOp::Move { from: 3, to: 1 };
        assert_eq!(follow(backward, 3), Some(1));
        assert_eq!(follow(backward, 1), Some(2));
        assert_eq!(follow(backward, 0), Some(0));

        assert_eq!(follow(EditOp::Change { position: 0, count: 4 }, 2), Some(2));
    }

    #[test]
    fn test_bound_rows_forget_dropped_holders() {
        let adapter = adapter(people());
        let kept = adapter.obtain_view(2).unwrap();
        drop(adapter.obtain_view(0).unwrap());

        adapter.remove_at(0).unwrap();

        assert_eq!(adapter.shared.bound_rows.len(), 1);
        assert_eq!(kept.position(), Some(1));
    }

    #[test]
    fn test_pooled_holder_is_not_shifted() {
        let adapter = adapter(people());
        let holder = adapter.obtain_view(0).unwrap();
        assert!(adapter.recycle_view(holder));

        adapter.add_at(0, Item::Person(9, "Lee".into())).unwrap();

        let reused = adapter.obtain_view(1).unwrap();
        assert_eq!(reused.position(), Some(1));
        assert_eq!(reused.view().text, "1:Adwoa");
    }

    #[test]
    fn test_click_reports_bound_item() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let recv = clicks.clone();
        let adapter = ListableAdapter::<Item, Label>::builder(PERSON)
            .with_listables(people())
            .with_template(PERSON, Label::default)
            .on_click(move |item, _view, position| recv.lock().push((item.clone(), position)))
            .build()
            .unwrap();

        let holder = adapter.create_view_holder(PERSON).unwrap();
        assert_eq!(adapter.click(&holder), Err(Error::UnboundView));

        let holder = adapter.obtain_view(2).unwrap();
        adapter.click(&holder).unwrap();

        assert_eq!(
            *clicks.lock(),
            vec![(Item::Person(3, "Kwame".into()), 2)]
        );
    }

    #[test]
    fn test_recycled_holder_is_unbound() {
        let mut pool = RecyclePool::new(1);
        let adapter = adapter(people());
        let holder = adapter.obtain_view(0).unwrap();

        assert!(pool.release(holder));
        let holder = pool.acquire(PERSON).unwrap();
        assert_eq!(holder.position(), None);
        assert!(pool.is_empty());
    }
}
