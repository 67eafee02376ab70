//! Thread affinity checks.
//!
//! List adapters are owned by the UI thread. Collection mutation, diffing and
//! binding all assume they run on the thread that created the adapter, and
//! [`ThreadAffinity`] lets them verify that cheaply.
//!
//! ```
//! use quicklist_core::ThreadAffinity;
//!
//! struct Surface {
//!     affinity: ThreadAffinity,
//! }
//!
//! impl Surface {
//!     fn update(&self) {
//!         self.affinity.debug_assert_same_thread();
//!         // ... safe to update ...
//!     }
//! }
//!
//! Surface { affinity: ThreadAffinity::current() }.update();
//! ```

use std::thread::ThreadId;

/// Records the thread an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Create an affinity bound to the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the bound thread, in debug builds only.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if called from a different thread.
    #[inline]
    #[track_caller]
    pub fn debug_assert_same_thread(&self) {
        debug_assert!(
            self.is_same_thread(),
            "object accessed from wrong thread: bound to {:?}, called from {:?}",
            self.thread_id,
            std::thread::current().id()
        );
    }
}
