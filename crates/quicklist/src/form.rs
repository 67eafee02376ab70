//! Form rows.
//!
//! A [`QuickFormInputElement`] is a named, typed text field shown as a list
//! row. Its `value` is kept in sync with the row's primary text input by the
//! input bridge, and [`ListableAdapter::retrieve_form_values`](crate::ListableAdapter::retrieve_form_values)
//! collects all of them into a `name -> value` map.

use std::fmt;
use std::sync::Arc;

use crate::listable::{Listable, ListableId, ListableType};

/// Built-in type of form rows.
pub const QUICK_FORM_INPUT: ListableType = ListableType::new("quick_form_input", 0xF0);

/// Callback invoked with the field's text after each completed edit.
pub type TextWatcher = Arc<dyn Fn(&str) + Send + Sync>;

/// Kind of value a form field accepts.
///
/// The list core never interprets this; it is forwarded to the host's
/// binding code to configure the input widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuickFormInputType {
    /// Free text.
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Masked text.
    Password,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
}

/// An editable form field displayed as a list row.
#[derive(Clone)]
pub struct QuickFormInputElement {
    /// Identity of the row.
    pub identifier: ListableId,
    /// Logical key used when extracting form results. Not unique.
    pub name: String,
    /// Current text.
    pub value: String,
    /// Label shown with the field.
    pub hint: String,
    /// Example value shown while the field is empty.
    pub placeholder: String,
    /// Kind of value the field accepts.
    pub input_type: QuickFormInputType,
    /// Callback run after each completed edit.
    pub text_watcher: Option<TextWatcher>,
}

impl QuickFormInputElement {
    /// Creates an empty text field.
    pub fn new(identifier: impl Into<ListableId>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            value: String::new(),
            hint: String::new(),
            placeholder: String::new(),
            input_type: QuickFormInputType::Text,
            text_watcher: None,
        }
    }

    /// Sets the initial value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Sets the placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Sets the input type.
    pub fn with_input_type(mut self, input_type: QuickFormInputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Sets the text watcher.
    pub fn with_text_watcher<F>(mut self, watcher: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.text_watcher = Some(Arc::new(watcher));
        self
    }
}

impl fmt::Debug for QuickFormInputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickFormInputElement")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("hint", &self.hint)
            .field("placeholder", &self.placeholder)
            .field("input_type", &self.input_type)
            .field("text_watcher", &self.text_watcher.as_ref().map(|_| ".."))
            .finish()
    }
}

// Watchers compare by identity.
impl PartialEq for QuickFormInputElement {
    fn eq(&self, other: &Self) -> bool {
        let watchers_equal = match (&self.text_watcher, &other.text_watcher) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.identifier == other.identifier
            && self.name == other.name
            && self.value == other.value
            && self.hint == other.hint
            && self.placeholder == other.placeholder
            && self.input_type == other.input_type
            && watchers_equal
    }
}

impl Listable for QuickFormInputElement {
    fn identifier(&self) -> ListableId {
        self.identifier.clone()
    }

    fn listable_type(&self) -> Option<ListableType> {
        Some(QUICK_FORM_INPUT)
    }

    fn form_input(&self) -> Option<&QuickFormInputElement> {
        Some(self)
    }

    fn form_input_mut(&mut self) -> Option<&mut QuickFormInputElement> {
        Some(self)
    }
}
