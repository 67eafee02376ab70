//! QuickList - data-bound adapters for heterogeneous lists.
//!
//! A [`ListableAdapter`] owns an ordered collection of [`Listable`] items of
//! mixed kinds, resolves the view template each row needs, recycles row views
//! per type, wires editable row fields back into the items and tells the host
//! exactly which rows changed through [`ListSignals`].
//!
//! # Example
//!
//! ```
//! use quicklist::{ListableAdapter, QuickFormInputElement, RowView, TextInput};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct FieldRow {
//!     input: Arc<TextInput>,
//! }
//!
//! impl RowView for FieldRow {
//!     fn find_input(&self, tag: &str) -> Option<Arc<TextInput>> {
//!         (tag == "input").then(|| self.input.clone())
//!     }
//! }
//!
//! let adapter = ListableAdapter::<QuickFormInputElement, FieldRow>::builder(quicklist::QUICK_FORM_INPUT)
//!     .with_listables([QuickFormInputElement::new("first", "firstname")])
//!     .with_template(quicklist::QUICK_FORM_INPUT, FieldRow::default)
//!     .build()?;
//!
//! let row = adapter.obtain_view(0)?;
//! row.view().input.commit_text("Adwoa");
//!
//! assert_eq!(adapter.retrieve_form_values()["firstname"], "Adwoa");
//! # Ok::<(), quicklist::Error>(())
//! ```

pub mod adapter;
pub mod binding;
pub mod diff;
pub mod error;
pub mod form;
pub mod input;
pub mod listable;
pub mod signals;
pub mod text_input;

pub use adapter::{
    AdapterBuilder, BindingListener, ClickListener, DEFAULT_MAX_RECYCLED_VIEWS,
    DEFAULT_PRIMARY_INPUT_TAG, InputChangeListener, ListableAdapter,
};
pub use binding::{RecyclePool, RowView, ViewHolder, ViewTemplate};
pub use diff::{EditOp, EditScript, diff};
pub use error::{Error, Result};
pub use form::{QUICK_FORM_INPUT, QuickFormInputElement, QuickFormInputType, TextWatcher};
pub use input::InputValue;
pub use listable::{LayoutId, Listable, ListableId, ListableType, resolve_type};
pub use signals::ListSignals;
pub use text_input::TextInput;

pub use quicklist_core::{ConnectionId, Signal};
