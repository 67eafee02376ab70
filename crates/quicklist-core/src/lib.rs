//! Core systems for QuickList.
//!
//! This crate provides the building blocks the list adapter is made of:
//!
//! - **Signal/Slot System**: Type-safe change notifications
//! - **Thread Affinity**: Checks that UI-owned state stays on its thread
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use quicklist_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello".to_string());
//! text_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;
pub mod thread_check;

pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
