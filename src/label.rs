//! Scoped run labels
//!
//! A run label names the top-level export currently in progress. It is used
//! only to annotate progress descriptions and never affects the items that flow
//! through a pipeline.
//!
//! The label lives in thread-local storage: every thread has its own current
//! label, so two exports on different threads cannot observe each other's label.
//! Within a thread, scopes nest. Entering a scope shadows the current label and
//! leaving it (normally, through `?`, or during unwinding) restores the label
//! that was active before.
//!
//! # Example
//! ```
//! use itemflow::label::{current_label, with_label};
//!
//! assert_eq!(current_label(), None);
//! with_label(Some("daily-sync"), || {
//!     assert_eq!(current_label().as_deref(), Some("daily-sync"));
//! });
//! assert_eq!(current_label(), None);
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static CURRENT_LABEL: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Read the label of the innermost active scope on this thread
pub fn current_label() -> Option<String> {
    CURRENT_LABEL.with(|label| label.borrow().clone())
}

/// Run `f` with `label` as the current run label
///
/// `None` is a real value here: it hides any outer label for the duration of `f`.
pub fn with_label<R>(label: Option<&str>, f: impl FnOnce() -> R) -> R {
    let _scope = LabelScope::enter(label);
    f()
}

/// RAII guard for a run label scope
///
/// Restores the previous label when dropped. Guards must be dropped in reverse
/// order of creation, which ordinary lexical scoping guarantees.
#[must_use = "the label is restored as soon as the scope guard is dropped"]
pub struct LabelScope {
    previous: Option<String>,
    // Restoring touches this thread's storage, so the guard must stay here
    _not_send: PhantomData<*const ()>,
}

impl LabelScope {
    /// Make `label` the current run label until the returned guard is dropped
    pub fn enter(label: Option<&str>) -> Self {
        let previous = CURRENT_LABEL.with(|current| current.replace(label.map(str::to_owned)));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for LabelScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_LABEL.with(|current| *current.borrow_mut() = previous);
    }
}
