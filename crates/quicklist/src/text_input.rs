//! A headless single-line text field.
//!
//! Row views embed [`TextInput`]s for their editable fields and expose them by
//! tag through [`RowView::find_input`](crate::RowView::find_input). The input
//! bridge listens to the two signals:
//!
//! - `text_changed` fires on every change of the text (live edits),
//! - `editing_finished` fires when an edit is completed.
//!
//! The field is shared between the view and the bridge as `Arc<TextInput>`,
//! so all methods take `&self`.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use quicklist_core::Signal;

/// An editable text field with a cursor.
pub struct TextInput {
    text: RwLock<String>,
    /// Cursor position as a byte offset on a char boundary.
    cursor: AtomicUsize,

    /// Signal emitted with the new text whenever the text changes.
    pub text_changed: Signal<String>,

    /// Signal emitted with the current text when editing is finished.
    pub editing_finished: Signal<String>,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextInput")
            .field("text", &*self.text.read())
            .field("cursor", &self.cursor_position())
            .finish_non_exhaustive()
    }
}

impl TextInput {
    /// Create an empty field.
    pub fn new() -> Self {
        Self {
            text: RwLock::new(String::new()),
            cursor: AtomicUsize::new(0),
            text_changed: Signal::new(),
            editing_finished: Signal::new(),
        }
    }

    /// Create a field with initial text and the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let input = Self::new();
        input.cursor.store(text.len(), Ordering::SeqCst);
        *input.text.write() = text;
        input
    }

    /// The current text.
    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    /// Replace the text.
    ///
    /// Emits `text_changed` if the text differs. The cursor keeps its offset,
    /// clamped to the new text.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut current = self.text.write();
            if *current == text {
                return;
            }
            current.clone_from(&text);
            let cursor = snap_to_char_boundary(&current, self.cursor.load(Ordering::SeqCst));
            self.cursor.store(cursor, Ordering::SeqCst);
        }
        self.text_changed.emit(text);
    }

    /// Clear the text.
    pub fn clear(&self) {
        self.set_text("");
    }

    /// Mark the current edit as complete, emitting `editing_finished`.
    pub fn finish_editing(&self) {
        self.editing_finished.emit(self.text());
    }

    /// Replace the text and complete the edit in one step, as a keystroke
    /// does.
    pub fn commit_text(&self, text: impl Into<String>) {
        self.set_text(text);
        self.finish_editing();
    }

    /// The cursor position (byte offset).
    pub fn cursor_position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Move the cursor, clamped to the text and snapped back to a char
    /// boundary.
    pub fn set_cursor_position(&self, position: usize) {
        let text = self.text.read();
        self.cursor
            .store(snap_to_char_boundary(&text, position), Ordering::SeqCst);
    }

    /// Move the cursor after the last character.
    pub fn move_cursor_to_end(&self) {
        let end = self.text.read().len();
        self.cursor.store(end, Ordering::SeqCst);
    }
}

fn snap_to_char_boundary(text: &str, position: usize) -> usize {
    let mut position = position.min(text.len());
    while !text.is_char_boundary(position) {
        position -= 1;
    }
    position
}

static_assertions::assert_impl_all!(TextInput: Send, Sync);
