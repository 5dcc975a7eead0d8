//! Error types for the Cadence dispatcher, organized by subsystem:
//! enqueue (dispatch queue), action (async action misuse), and
//! callback (captured work outcomes).

use std::error::Error;
use std::fmt;

/// Error submitting work to the dispatch queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue has been told to exit and no longer accepts work.
    Rejected,
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "dispatch queue is shutting down"),
        }
    }
}

impl Error for EnqueueError {}

/// Misuse of an async action's one-shot surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionError {
    /// `invoke_and_fire_completion` was called more than once.
    AlreadyInvoked,
    /// A completion handler is already attached; at most one is allowed.
    HandlerAlreadyAttached,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInvoked => write!(f, "async action was already invoked"),
            Self::HandlerAlreadyAttached => {
                write!(f, "async action already has a completion handler")
            }
        }
    }
}

impl Error for ActionError {}

/// Failure captured from a submitted callback.
///
/// A failing callback never unwinds the dispatch thread: the error is
/// stored as the action's outcome and surfaced to whoever observes
/// completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback returned an error.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The callback panicked; the panic was caught on the dispatch thread.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl CallbackError {
    /// Convenience constructor for [`CallbackError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "callback failed: {reason}"),
            Self::Panicked { message } => write!(f, "callback panicked: {message}"),
        }
    }
}

impl Error for CallbackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(
            EnqueueError::Rejected.to_string(),
            "dispatch queue is shutting down"
        );
        assert_eq!(
            ActionError::AlreadyInvoked.to_string(),
            "async action was already invoked"
        );
        assert_eq!(
            CallbackError::failed("boom").to_string(),
            "callback failed: boom"
        );
    }

    #[test]
    fn callback_error_is_comparable() {
        assert_eq!(CallbackError::failed("x"), CallbackError::failed("x"));
        assert_ne!(
            CallbackError::failed("x"),
            CallbackError::Panicked {
                message: "x".into()
            }
        );
    }
}
