//! Logging facilities for QuickList.
//!
//! QuickList is instrumented with the `tracing` crate. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_max_level(tracing::Level::DEBUG)
//!     .init();
//! ```
//!
//! The constants in [`targets`] can be used in filter directives, for example
//! `RUST_LOG=quicklist::diff=trace`.

/// Target names for log filtering.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "quicklist_core::signal";
    /// Adapter mutation target.
    pub const ADAPTER: &str = "quicklist::adapter";
    /// Diff engine target.
    pub const DIFF: &str = "quicklist::diff";
    /// View creation, binding and recycling target.
    pub const BINDING: &str = "quicklist::binding";
    /// Input bridge target.
    pub const INPUT: &str = "quicklist::input";
    /// Performance span target.
    pub const PERF: &str = "quicklist::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time operations such as a diff pass.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "quicklist::perf", "perf", operation);
        Self {
            _span: span.entered(),
        }
    }
}
