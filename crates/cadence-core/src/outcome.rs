//! Action status, outcome, and callback value types.
//!
//! The queue and the async action depend only on "a callable returning
//! a result or error", not on any host-provided handler interface, so
//! hosts integrate through these plain callback-plus-outcome types.

use crate::error::CallbackError;

/// A unit of work submitted to the dispatch queue.
///
/// Errors returned here are captured as the action's outcome rather
/// than propagated out of the dispatch loop.
pub type DispatchCallback = Box<dyn FnOnce() -> Result<(), CallbackError> + Send + 'static>;

/// Completion notification for an async action.
///
/// Invoked exactly once, after the wrapped callback has finished (or
/// the action was canceled), with no action-internal lock held.
pub type CompletionHandler = Box<dyn FnOnce(ActionOutcome) + Send + 'static>;

/// Lifecycle state of an async action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionStatus {
    /// Constructed, not yet invoked.
    Created,
    /// The wrapped callback is executing on the dispatch thread.
    Running,
    /// The callback finished; the outcome is stored.
    Completed,
    /// The action was discarded before it ran.
    Canceled,
}

/// Terminal outcome of an async action, delivered to the completion
/// handler and stored for late observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The callback ran and returned `Ok`.
    Completed,
    /// The callback ran and failed (error return or panic).
    Failed(CallbackError),
    /// The action was canceled before its callback ran.
    Canceled,
}

impl ActionOutcome {
    /// True if the callback ran to a successful completion.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
