//! The listable capability: identity and type tags for list items.
//!
//! Every item shown by a [`ListableAdapter`](crate::ListableAdapter)
//! implements [`Listable`]. Two pieces of information drive the adapter:
//!
//! - the [`ListableId`], which says whether two items across two versions of
//!   the list are the same logical row, and
//! - the optional [`ListableType`], which picks the view template used to
//!   render the row. Items without a type use the adapter's default type.
//!
//! Content equality is the item's `PartialEq` implementation. It decides
//! whether a row that kept its identity needs to be re-bound.
//!
//! # Example
//!
//! ```
//! use quicklist::{Listable, ListableId, ListableType};
//!
//! const ANIMAL: ListableType = ListableType::new("animal", 2);
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Animal {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Listable for Animal {
//!     fn identifier(&self) -> ListableId {
//!         self.id.into()
//!     }
//!
//!     fn listable_type(&self) -> Option<ListableType> {
//!         Some(ANIMAL)
//!     }
//! }
//! ```

use std::fmt;

use crate::form::QuickFormInputElement;

/// Stable identity of a list item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListableId {
    /// Numeric identifier.
    Int(u64),
    /// Textual identifier.
    Str(String),
}

impl fmt::Display for ListableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<u64> for ListableId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<u32> for ListableId {
    fn from(id: u32) -> Self {
        Self::Int(u64::from(id))
    }
}

impl From<usize> for ListableId {
    fn from(id: usize) -> Self {
        Self::Int(id as u64)
    }
}

impl From<&str> for ListableId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_owned())
    }
}

impl From<String> for ListableId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Handle of a view template (the layout a row is inflated from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(pub u32);

/// Associates an item kind with a view template.
///
/// Each concrete item kind maps to exactly one `ListableType`. Types are
/// plain values, usually declared as constants next to the item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListableType {
    name: &'static str,
    layout: LayoutId,
}

impl ListableType {
    /// Creates a type tag named `name` rendered with layout `layout`.
    pub const fn new(name: &'static str, layout: u32) -> Self {
        Self {
            name,
            layout: LayoutId(layout),
        }
    }

    /// Human readable name of the type.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The view template handle.
    pub const fn layout(&self) -> LayoutId {
        self.layout
    }
}

impl fmt::Display for ListableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An item that can appear as a row in a [`ListableAdapter`](crate::ListableAdapter).
///
/// Implementors must keep [`identifier`](Listable::identifier) stable for the
/// whole lifetime of the logical item, and `PartialEq` must compare every
/// displayed field.
pub trait Listable: Clone + PartialEq + Send + Sync + 'static {
    /// The identity key used for diffing.
    fn identifier(&self) -> ListableId;

    /// The type tag selecting the view template, if the item overrides the
    /// adapter default.
    fn listable_type(&self) -> Option<ListableType> {
        None
    }

    /// The form element carried by this item, if it is a form row.
    fn form_input(&self) -> Option<&QuickFormInputElement> {
        None
    }

    /// Mutable access to the form element carried by this item.
    fn form_input_mut(&mut self) -> Option<&mut QuickFormInputElement> {
        None
    }
}

/// Picks the view type for `item`: its own tag, else `default`.
pub fn resolve_type<T: Listable>(item: &T, default: ListableType) -> ListableType {
    item.listable_type().unwrap_or(default)
}
