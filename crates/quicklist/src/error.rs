//! Error types for list adapters.

use crate::listable::{ListableId, ListableType};

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by adapter operations. A failed operation leaves the
/// adapter unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A positional argument is outside the collection.
    #[error("position {position} is out of bounds for a list of {len} items")]
    OutOfBounds { position: usize, len: usize },

    /// Two items would share one identifier.
    #[error("duplicate listable identifier '{0}'")]
    DuplicateIdentifier(ListableId),

    /// No view template is registered for the resolved type.
    #[error("no view template registered for listable type '{0}'")]
    UnregisteredType(ListableType),

    /// A view holder was asked to display an item of another type.
    #[error("a '{found}' view cannot display an item of type '{expected}'")]
    TypeMismatch {
        expected: ListableType,
        found: ListableType,
    },

    /// The view holder has not been bound to a position yet.
    #[error("view holder is not bound to a position")]
    UnboundView,
}

impl Error {
    /// Create an out-of-bounds error.
    pub fn out_of_bounds(position: usize, len: usize) -> Self {
        Self::OutOfBounds { position, len }
    }

    /// Create a duplicate identifier error.
    pub fn duplicate(identifier: ListableId) -> Self {
        Self::DuplicateIdentifier(identifier)
    }
}
