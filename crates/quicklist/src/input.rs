//! Feedback from editable row fields into the list.
//!
//! When the adapter creates a view holder, it looks up the view's editable
//! fields by tag and connects to their signals:
//!
//! - The primary field (tag `"input"` unless configured otherwise) edits the
//!   row's form element directly. Every live edit is written to
//!   [`QuickFormInputElement::value`](crate::QuickFormInputElement::value);
//!   a completed edit runs the element's text watcher.
//! - Custom tagged fields leave the item alone and report each live edit to
//!   the host's input change callback as an [`InputValue`].
//!
//! A completed edit on any connected field moves its cursor to the end.
//!
//! The connections hold only weak references to the adapter, so a view
//! outliving its adapter simply stops reporting. Dropping the holder
//! disconnects them.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use quicklist_core::ConnectionId;
use quicklist_core::logging::targets;

use crate::adapter::{ListableAdapter, Shared};
use crate::binding::{BoundPosition, RowView};
use crate::listable::Listable;
use crate::text_input::TextInput;

/// An edit of a custom tagged field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputValue {
    /// Tag of the edited field.
    pub tag: String,
    /// The field's text after the edit.
    pub value: String,
}

impl InputValue {
    /// Creates an input value.
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum InputSignal {
    TextChanged,
    EditingFinished,
}

/// The signal connections between one row view's fields and its adapter.
#[derive(Default)]
pub(crate) struct InputBridge {
    connections: Vec<(Arc<TextInput>, InputSignal, ConnectionId)>,
}

impl InputBridge {
    /// Connects the primary and custom tagged fields of `view`.
    pub(crate) fn attach<T: Listable, V: RowView>(
        shared: &Arc<Shared<T, V>>,
        view: &V,
        position: &Arc<BoundPosition>,
    ) -> Self {
        let mut bridge = Self::default();

        if let Some(input) = view.find_input(&shared.primary_input_tag) {
            let adapter = Arc::downgrade(shared);
            let bound = position.clone();
            let id = input.text_changed.connect(move |text| {
                if let Some(shared) = adapter.upgrade() {
                    shared.apply_primary_edit(&bound, text);
                }
            });
            bridge.track(&input, InputSignal::TextChanged, id);

            let adapter = Arc::downgrade(shared);
            let bound = position.clone();
            let field = Arc::downgrade(&input);
            let id = input.editing_finished.connect(move |text| {
                if let Some(shared) = adapter.upgrade() {
                    shared.finish_primary_edit(&bound, text);
                }
                move_cursor_to_end(&field);
            });
            bridge.track(&input, InputSignal::EditingFinished, id);
        }

        for tag in &shared.input_tags {
            let Some(input) = view.find_input(tag) else {
                tracing::trace!(target: targets::INPUT, tag = %tag, "view has no field for tag");
                continue;
            };

            let adapter = Arc::downgrade(shared);
            let bound = position.clone();
            let field_tag = tag.clone();
            let id = input.text_changed.connect(move |text| {
                if let Some(shared) = adapter.upgrade() {
                    shared.raise_custom_edit(&bound, &field_tag, text);
                }
            });
            bridge.track(&input, InputSignal::TextChanged, id);

            let field = Arc::downgrade(&input);
            let id = input
                .editing_finished
                .connect(move |_| move_cursor_to_end(&field));
            bridge.track(&input, InputSignal::EditingFinished, id);
        }

        bridge
    }

    fn track(&mut self, input: &Arc<TextInput>, signal: InputSignal, id: ConnectionId) {
        self.connections.push((input.clone(), signal, id));
    }

    /// Blocks `text_changed` on each connected field not blocked already and
    /// returns those fields.
    pub(crate) fn block_text_changes(&self) -> Vec<Arc<TextInput>> {
        let mut blocked: Vec<Arc<TextInput>> = Vec::new();
        for (input, signal, _) in &self.connections {
            if !matches!(signal, InputSignal::TextChanged) || input.text_changed.is_blocked() {
                continue;
            }
            input.text_changed.set_blocked(true);
            blocked.push(input.clone());
        }
        blocked
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Drop for InputBridge {
    fn drop(&mut self) {
        for (input, signal, id) in self.connections.drain(..) {
            match signal {
                InputSignal::TextChanged => input.text_changed.disconnect(id),
                InputSignal::EditingFinished => input.editing_finished.disconnect(id),
            };
        }
    }
}

fn move_cursor_to_end(field: &Weak<TextInput>) {
    if let Some(input) = field.upgrade() {
        input.move_cursor_to_end();
    }
}

impl<T: Listable, V> Shared<T, V> {
    fn apply_primary_edit(&self, bound: &BoundPosition, text: &str) -> Option<usize> {
        let mut items = self.items.write();
        let Some(position) = bound.get() else {
            tracing::debug!(target: targets::INPUT, "edit on unbound row ignored");
            return None;
        };

        let Some(element) = items.get_mut(position).and_then(Listable::form_input_mut) else {
            tracing::debug!(
                target: targets::INPUT,
                position,
                "edit on row without form element ignored"
            );
            return None;
        };
        if element.value != text {
            element.value = text.to_owned();
            tracing::trace!(target: targets::INPUT, position, "form value updated");
        }
        Some(position)
    }

    fn finish_primary_edit(&self, bound: &BoundPosition, text: &str) {
        let watcher = self.apply_primary_edit(bound, text).and_then(|position| {
            self.items
                .read()
                .get(position)
                .and_then(Listable::form_input)
                .and_then(|element| element.text_watcher.clone())
        });
        if let Some(watcher) = watcher {
            watcher(text);
        }
    }

    fn raise_custom_edit(&self, bound: &BoundPosition, tag: &str, text: &str) {
        let Some(listener) = &self.input_change_listener else {
            return;
        };
        let row = {
            let items = self.items.read();
            bound
                .get()
                .and_then(|position| Some((position, items.get(position)?.clone())))
        };
        let Some((position, item)) = row else {
            tracing::debug!(target: targets::INPUT, tag, "edit on unbound row ignored");
            return;
        };
        listener(&item, position, InputValue::new(tag, text));
    }
}

impl<T: Listable, V: RowView> ListableAdapter<T, V> {
    /// Collects the `name -> value` pairs of every form element in the list.
    ///
    /// When several elements share a name, the last one in display order
    /// wins.
    pub fn retrieve_form_values(&self) -> HashMap<String, String> {
        self.shared
            .items
            .read()
            .iter()
            .filter_map(Listable::form_input)
            .map(|element| (element.name.clone(), element.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::form::{QUICK_FORM_INPUT, QuickFormInputElement};
    use crate::listable::{ListableId, ListableType};
    use parking_lot::Mutex;

    const NOTE: ListableType = ListableType::new("note", 4);

    #[derive(Debug, Clone, PartialEq)]
    enum Row {
        Field(QuickFormInputElement),
        Note(u64, String),
    }

    impl Listable for Row {
        fn identifier(&self) -> ListableId {
            match self {
                Row::Field(element) => element.identifier(),
                Row::Note(id, _) => (*id).into(),
            }
        }

        fn listable_type(&self) -> Option<ListableType> {
            match self {
                Row::Field(_) => Some(QUICK_FORM_INPUT),
                Row::Note(..) => None,
            }
        }

        fn form_input(&self) -> Option<&QuickFormInputElement> {
            match self {
                Row::Field(element) => Some(element),
                Row::Note(..) => None,
            }
        }

        fn form_input_mut(&mut self) -> Option<&mut QuickFormInputElement> {
            match self {
                Row::Field(element) => Some(element),
                Row::Note(..) => None,
            }
        }
    }

    #[derive(Default)]
    struct FieldView {
        input: Arc<TextInput>,
        comment: Arc<TextInput>,
    }

    impl RowView for FieldView {
        fn find_input(&self, tag: &str) -> Option<Arc<TextInput>> {
            match tag {
                "input" => Some(self.input.clone()),
                "comment" => Some(self.comment.clone()),
                _ => None,
            }
        }
    }

    type Edits = Arc<Mutex<Vec<(usize, InputValue)>>>;

    fn field(id: &str, name: &str) -> Row {
        Row::Field(QuickFormInputElement::new(id, name))
    }

    fn adapter(rows: Vec<Row>, tags: &[&str]) -> (ListableAdapter<Row, FieldView>, Edits) {
        let edits: Edits = Arc::new(Mutex::new(Vec::new()));
        let recv = edits.clone();
        let adapter = ListableAdapter::builder(NOTE)
            .with_listables(rows)
            .with_template(QUICK_FORM_INPUT, FieldView::default)
            .with_template(NOTE, FieldView::default)
            .with_input_tags(tags.iter().copied())
            .on_input_change(move |_item, position, value| recv.lock().push((position, value)))
            .build()
            .unwrap();
        (adapter, edits)
    }

    fn value_at(adapter: &ListableAdapter<Row, FieldView>, position: usize) -> String {
        adapter
            .item(position)
            .unwrap()
            .form_input()
            .map(|element| element.value.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_primary_field_updates_value_on_each_keystroke() {
        let (adapter, edits) = adapter(vec![field("first", "firstname")], &[]);
        let holder = adapter.obtain_view(0).unwrap();
        let input = holder.view().input.clone();

        for text in ["H", "He", "Hel"] {
            input.set_text(text);
            assert_eq!(value_at(&adapter, 0), text);
        }

        assert!(edits.lock().is_empty());
    }

    #[test]
    fn test_completed_edit_runs_watcher_and_moves_cursor() {
        let watched = Arc::new(Mutex::new(Vec::new()));
        let recv = watched.clone();
        let element = QuickFormInputElement::new("date", "date")
            .with_text_watcher(move |text| recv.lock().push(text.to_string()));
        let (adapter, _) = adapter(vec![Row::Field(element)], &[]);

        let holder = adapter.obtain_view(0).unwrap();
        let input = holder.view().input.clone();
        input.set_text("2024-05");
        input.set_cursor_position(0);
        input.commit_text("2024-05-01");

        assert_eq!(*watched.lock(), vec!["2024-05-01".to_string()]);
        assert_eq!(input.cursor_position(), "2024-05-01".len());
        assert_eq!(value_at(&adapter, 0), "2024-05-01");
    }

    #[test]
    fn test_custom_tag_reports_without_touching_item() {
        let (adapter, edits) = adapter(
            vec![Row::Note(1, "n".into()), field("first", "firstname")],
            &["comment"],
        );
        let holder = adapter.obtain_view(1).unwrap();
        let comment = holder.view().comment.clone();

        comment.set_text("looks good");
        comment.set_cursor_position(0);
        comment.finish_editing();

        assert_eq!(
            *edits.lock(),
            vec![(1, InputValue::new("comment", "looks good"))]
        );
        assert_eq!(value_at(&adapter, 1), "");
        assert_eq!(comment.cursor_position(), "looks good".len());
    }

    #[test]
    fn test_undeclared_tags_are_not_connected() {
        let (adapter, edits) = adapter(vec![field("first", "firstname")], &[]);
        let holder = adapter.obtain_view(0).unwrap();

        holder.view().comment.set_text("ignored");

        assert_eq!(holder.input_connection_count(), 2);
        assert!(edits.lock().is_empty());
    }

    #[test]
    fn test_edits_on_unbound_holder_are_ignored() {
        let (adapter, edits) = adapter(vec![field("first", "firstname")], &["comment"]);
        let holder = adapter.create_view_holder(QUICK_FORM_INPUT).unwrap();

        holder.view().input.set_text("x");
        holder.view().comment.set_text("y");

        assert_eq!(value_at(&adapter, 0), "");
        assert!(edits.lock().is_empty());
    }

    #[test]
    fn test_recycled_holder_stops_reporting() {
        let (adapter, _) = adapter(vec![field("first", "firstname")], &[]);
        let holder = adapter.obtain_view(0).unwrap();
        let input = holder.view().input.clone();

        assert!(adapter.recycle_view(holder));
        input.set_text("late");

        assert_eq!(value_at(&adapter, 0), "");
    }

    #[test]
    fn test_dropped_holder_disconnects() {
        let (adapter, _) = adapter(vec![field("first", "firstname")], &[]);
        let holder = adapter.obtain_view(0).unwrap();
        let input = holder.view().input.clone();
        assert_eq!(input.text_changed.connection_count(), 1);

        drop(holder);

        assert_eq!(input.text_changed.connection_count(), 0);
        assert_eq!(input.editing_finished.connection_count(), 0);
    }

    #[test]
    fn test_edit_on_removed_row_is_ignored() {
        let (adapter, _) = adapter(vec![field("a", "a"), field("b", "b")], &[]);
        let holder = adapter.obtain_view(1).unwrap();
        adapter.remove_at(1).unwrap();

        holder.view().input.set_text("orphan");

        assert_eq!(adapter.len(), 1);
        assert_eq!(holder.position(), None);
        assert_eq!(value_at(&adapter, 0), "");
        assert_eq!(adapter.click(&holder), Err(Error::UnboundView));
    }

    #[test]
    fn test_edit_follows_row_after_insert_above() {
        let (adapter, _) = adapter(vec![field("a", "first"), field("b", "last")], &[]);
        let holder = adapter.obtain_view(1).unwrap();

        adapter.add_at(0, field("c", "email")).unwrap();
        holder.view().input.set_text("Mensah");

        assert_eq!(holder.position(), Some(2));
        let values = adapter.retrieve_form_values();
        assert_eq!(values["last"], "Mensah");
        assert_eq!(values["email"], "");
        assert_eq!(values["first"], "");
    }

    #[test]
    fn test_edit_follows_row_after_bulk_insert_above() {
        let (adapter, edits) = adapter(
            vec![Row::Note(1, "n".into()), field("b", "last")],
            &["comment"],
        );
        let note = adapter.obtain_view(0).unwrap();

        adapter
            .add_all_at(0, vec![field("c", "email"), field("d", "phone")])
            .unwrap();
        note.view().comment.set_text("moved");

        assert_eq!(note.position(), Some(2));
        assert_eq!(*edits.lock(), vec![(2, InputValue::new("comment", "moved"))]);
    }

    #[test]
    fn test_edit_follows_row_after_remove_above() {
        let (adapter, _) = adapter(
            vec![field("a", "first"), field("b", "middle"), field("c", "last")],
            &[],
        );
        let holder = adapter.obtain_view(2).unwrap();

        adapter.remove_at(0).unwrap();
        holder.view().input.set_text("Mensah");

        assert_eq!(holder.position(), Some(1));
        let values = adapter.retrieve_form_values();
        assert_eq!(values["last"], "Mensah");
        assert_eq!(values["middle"], "");
    }

    #[test]
    fn test_edit_follows_row_after_reorder() {
        let (adapter, _) = adapter(
            vec![field("a", "first"), field("b", "middle"), field("c", "last")],
            &[],
        );
        let holder = adapter.obtain_view(0).unwrap();

        adapter
            .set_listables(vec![field("b", "middle"), field("c", "last"), field("a", "first")])
            .unwrap();
        holder.view().input.set_text("Adwoa");

        assert_eq!(holder.position(), Some(2));
        let values = adapter.retrieve_form_values();
        assert_eq!(values["first"], "Adwoa");
        assert_eq!(values["middle"], "");
        assert_eq!(values["last"], "");
    }

    #[test]
    fn test_replaced_list_unbinds_dropped_rows() {
        let (adapter, _) = adapter(vec![field("a", "first"), field("b", "last")], &[]);
        let gone = adapter.obtain_view(0).unwrap();
        let kept = adapter.obtain_view(1).unwrap();

        adapter.set_listables(vec![field("b", "last")]).unwrap();

        assert_eq!(gone.position(), None);
        assert_eq!(kept.position(), Some(0));

        adapter.clear();
        assert_eq!(kept.position(), None);
    }

    #[test]
    fn test_fields_filled_while_binding_do_not_report() {
        let edits: Edits = Arc::new(Mutex::new(Vec::new()));
        let recv = edits.clone();
        let adapter = ListableAdapter::<Row, FieldView>::builder(NOTE)
            .with_listables([Row::Note(1, "first draft".into())])
            .with_template(NOTE, FieldView::default)
            .with_input_tags(["comment"])
            .on_bind(|item, view: &mut FieldView, _| {
                if let Row::Note(_, text) = item {
                    view.comment.set_text(text.clone());
                }
            })
            .on_input_change(move |_item, position, value| recv.lock().push((position, value)))
            .build()
            .unwrap();

        let holder = adapter.obtain_view(0).unwrap();
        assert_eq!(holder.view().comment.text(), "first draft");
        assert!(edits.lock().is_empty());
        assert!(!holder.view().comment.text_changed.is_blocked());

        holder.view().comment.set_text("second draft");
        assert_eq!(
            *edits.lock(),
            vec![(0, InputValue::new("comment", "second draft"))]
        );
    }

    #[test]
    fn test_with_listables_may_edit_bound_fields() {
        let (adapter, _) = adapter(vec![field("a", "first")], &[]);
        let holder = adapter.obtain_view(0).unwrap();

        let before = adapter.with_listables(|items| {
            holder.view().input.set_text("Kwame");
            items[0].form_input().map(|element| element.value.clone())
        });

        assert_eq!(before.as_deref(), Some(""));
        assert_eq!(value_at(&adapter, 0), "Kwame");
    }

    #[test]
    fn test_retrieve_form_values() {
        let (adapter, _) = adapter(
            vec![
                Row::Field(QuickFormInputElement::new("a", "a").with_value("x")),
                Row::Note(1, "skip".into()),
                Row::Field(QuickFormInputElement::new("b", "b").with_value("y")),
            ],
            &[],
        );

        let values = adapter.retrieve_form_values();

        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], "x");
        assert_eq!(values["b"], "y");
    }

    #[test]
    fn test_retrieve_form_values_last_name_wins() {
        let (adapter, _) = adapter(
            vec![
                Row::Field(QuickFormInputElement::new("1", "city").with_value("Accra")),
                Row::Field(QuickFormInputElement::new("2", "city").with_value("Kumasi")),
            ],
            &[],
        );

        assert_eq!(adapter.retrieve_form_values()["city"], "Kumasi");
    }
}
