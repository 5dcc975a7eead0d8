//! One-shot schedulable unit of work with observable completion.
//!
//! An [`AsyncAction`] wraps a callback, tracks its lifecycle
//! (`Created → Running → Completed`, or `Canceled` if discarded before
//! running), and delivers a completion notification that may be
//! attached before *or after* the callback has already run.
//!
//! # The late-attach race
//!
//! A queued action can run to completion on the dispatch thread before
//! the submitting thread has finished attaching its completion handler.
//! [`set_completion_handler`](AsyncAction::set_completion_handler)
//! closes that race by inspecting the stored status: if the action has
//! already finished, the handler fires immediately and synchronously on
//! the attaching thread with the stored outcome, so no notification is
//! ever lost and no caller has to poll.
//!
//! # Locking rule
//!
//! The internal lock protects only the status/outcome/handler fields
//! and is always released before any user code (callback or handler)
//! runs. A handler that re-enters the action (to query its status or
//! schedule more work) can therefore never deadlock on it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::error::{ActionError, CallbackError};
use crate::outcome::{ActionOutcome, ActionStatus, CompletionHandler, DispatchCallback};

struct State {
    status: ActionStatus,
    callback: Option<DispatchCallback>,
    outcome: Option<ActionOutcome>,
    handler: Option<CompletionHandler>,
    /// Set on the first attach and never cleared, so a second attach is
    /// rejected even after the stored handler has been consumed.
    handler_attached: bool,
}

/// A one-shot unit of work submitted to the dispatch queue.
///
/// Cheap to clone; all clones share the same state. The queue keeps a
/// clone until the action is popped and invoked on the worker thread,
/// while the submitter keeps another to observe completion.
#[derive(Clone)]
pub struct AsyncAction {
    state: Arc<Mutex<State>>,
}

impl AsyncAction {
    /// Wrap a callback in a new action with status
    /// [`Created`](ActionStatus::Created).
    pub fn new(callback: DispatchCallback) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                status: ActionStatus::Created,
                callback: Some(callback),
                outcome: None,
                handler: None,
                handler_attached: false,
            })),
        }
    }

    /// Run the wrapped callback and fire the completion handler.
    ///
    /// Transitions `Created → Running → Completed`. The callback's
    /// error return, or its panic (caught here so it cannot unwind the
    /// dispatch thread), is captured as the outcome rather than
    /// propagated. The handler, if one is attached, is invoked after
    /// the transition with no internal lock held.
    ///
    /// Callable once; any further call returns
    /// [`ActionError::AlreadyInvoked`] without re-running the callback.
    pub fn invoke_and_fire_completion(&self) -> Result<(), ActionError> {
        let callback = {
            let mut state = self.state.lock().unwrap();
            if state.status != ActionStatus::Created {
                return Err(ActionError::AlreadyInvoked);
            }
            state.status = ActionStatus::Running;
            state.callback.take()
        };

        let outcome = match callback {
            Some(cb) => match panic::catch_unwind(AssertUnwindSafe(cb)) {
                Ok(Ok(())) => ActionOutcome::Completed,
                Ok(Err(err)) => ActionOutcome::Failed(err),
                Err(payload) => ActionOutcome::Failed(CallbackError::Panicked {
                    message: panic_message(payload.as_ref()),
                }),
            },
            // Constructed without a callback slot is unrepresentable,
            // but an empty invocation still completes.
            None => ActionOutcome::Completed,
        };

        let handler = {
            let mut state = self.state.lock().unwrap();
            state.status = ActionStatus::Completed;
            state.outcome = Some(outcome.clone());
            state.handler.take()
        };

        if let Some(handler) = handler {
            handler(outcome);
        }
        Ok(())
    }

    /// Attach the completion handler.
    ///
    /// If the action has already completed (or been canceled), the
    /// handler is invoked immediately and synchronously on the calling
    /// thread with the stored outcome. Otherwise it is stored and fired
    /// by [`invoke_and_fire_completion`](Self::invoke_and_fire_completion)
    /// or [`cancel`](Self::cancel).
    ///
    /// At most one handler may ever be attached; a second attach
    /// returns [`ActionError::HandlerAlreadyAttached`].
    pub fn set_completion_handler<F>(&self, handler: F) -> Result<(), ActionError>
    where
        F: FnOnce(ActionOutcome) + Send + 'static,
    {
        let mut slot: Option<CompletionHandler> = Some(Box::new(handler));
        let fire_now = {
            let mut state = self.state.lock().unwrap();
            if state.handler_attached {
                return Err(ActionError::HandlerAlreadyAttached);
            }
            state.handler_attached = true;
            match state.status {
                ActionStatus::Completed | ActionStatus::Canceled => state.outcome.clone(),
                ActionStatus::Created | ActionStatus::Running => {
                    state.handler = slot.take();
                    None
                }
            }
        };

        if let (Some(outcome), Some(handler)) = (fire_now, slot) {
            handler(outcome);
        }
        Ok(())
    }

    /// Discard the action before it runs.
    ///
    /// Transitions `Created → Canceled`, drops the callback, and fires
    /// the handler with [`ActionOutcome::Canceled`]. A no-op once the
    /// action is running or finished.
    pub fn cancel(&self) {
        let handler = {
            let mut state = self.state.lock().unwrap();
            if state.status != ActionStatus::Created {
                return;
            }
            state.status = ActionStatus::Canceled;
            state.callback = None;
            state.outcome = Some(ActionOutcome::Canceled);
            state.handler.take()
        };

        if let Some(handler) = handler {
            handler(ActionOutcome::Canceled);
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ActionStatus {
        self.state.lock().unwrap().status
    }

    /// The stored outcome, once the action has completed or been
    /// canceled.
    pub fn outcome(&self) -> Option<ActionOutcome> {
        self.state.lock().unwrap().outcome.clone()
    }
}

impl std::fmt::Debug for AsyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncAction")
            .field("status", &self.status())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> DispatchCallback {
        Box::new(|| Ok(()))
    }

    // ── lifecycle ──────────────────────────────────────────────

    #[test]
    fn invoke_runs_callback_and_completes() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        let action = AsyncAction::new(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        assert_eq!(action.status(), ActionStatus::Created);

        action.invoke_and_fire_completion().unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(action.status(), ActionStatus::Completed);
        assert_eq!(action.outcome(), Some(ActionOutcome::Completed));
    }

    #[test]
    fn second_invoke_is_rejected_and_does_not_rerun() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        let action = AsyncAction::new(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        action.invoke_and_fire_completion().unwrap();
        assert_eq!(
            action.invoke_and_fire_completion(),
            Err(ActionError::AlreadyInvoked)
        );
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_error_is_captured_as_outcome() {
        let action = AsyncAction::new(Box::new(|| Err(CallbackError::failed("boom"))));
        action.invoke_and_fire_completion().unwrap();
        assert_eq!(
            action.outcome(),
            Some(ActionOutcome::Failed(CallbackError::failed("boom")))
        );
    }

    #[test]
    fn callback_panic_is_captured_as_outcome() {
        let action = AsyncAction::new(Box::new(|| panic!("tick exploded")));
        action.invoke_and_fire_completion().unwrap();
        match action.outcome() {
            Some(ActionOutcome::Failed(CallbackError::Panicked { message })) => {
                assert_eq!(message, "tick exploded");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // ── completion handler ─────────────────────────────────────

    #[test]
    fn handler_attached_before_invoke_fires_once_with_outcome() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        let action = AsyncAction::new(noop());
        action
            .set_completion_handler(move |outcome| {
                assert_eq!(outcome, ActionOutcome::Completed);
                fired2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        action.invoke_and_fire_completion().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_attached_after_completion_fires_immediately() {
        let action = AsyncAction::new(Box::new(|| Err(CallbackError::failed("late"))));
        action.invoke_and_fire_completion().unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        action
            .set_completion_handler(move |outcome| {
                assert_eq!(outcome, ActionOutcome::Failed(CallbackError::failed("late")));
                fired2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        // Fired synchronously on this thread, with the original outcome.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_attach_is_rejected_even_after_fire() {
        let action = AsyncAction::new(noop());
        action.invoke_and_fire_completion().unwrap();
        action.set_completion_handler(|_| {}).unwrap();
        assert_eq!(
            action.set_completion_handler(|_| {}),
            Err(ActionError::HandlerAlreadyAttached)
        );
    }

    #[test]
    fn handler_may_reenter_the_action() {
        // Would deadlock if the internal lock were held during the
        // handler invocation.
        let action = AsyncAction::new(noop());
        let probe = action.clone();
        action
            .set_completion_handler(move |_| {
                assert_eq!(probe.status(), ActionStatus::Completed);
                assert!(probe.outcome().is_some());
            })
            .unwrap();
        action.invoke_and_fire_completion().unwrap();
    }

    // ── cancel ─────────────────────────────────────────────────

    #[test]
    fn cancel_before_invoke_fires_handler_with_canceled() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        let action = AsyncAction::new(Box::new(|| {
            panic!("canceled callback must never run");
        }));
        action
            .set_completion_handler(move |outcome| {
                assert_eq!(outcome, ActionOutcome::Canceled);
                fired2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        action.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(action.status(), ActionStatus::Canceled);
        assert_eq!(action.outcome(), Some(ActionOutcome::Canceled));
    }

    #[test]
    fn cancel_after_completion_is_a_noop() {
        let action = AsyncAction::new(noop());
        action.invoke_and_fire_completion().unwrap();
        action.cancel();
        assert_eq!(action.status(), ActionStatus::Completed);
        assert_eq!(action.outcome(), Some(ActionOutcome::Completed));
    }

    #[test]
    fn invoke_after_cancel_is_rejected() {
        let action = AsyncAction::new(noop());
        action.cancel();
        assert_eq!(
            action.invoke_and_fire_completion(),
            Err(ActionError::AlreadyInvoked)
        );
    }

    #[test]
    fn attach_after_cancel_fires_immediately_with_canceled() {
        let action = AsyncAction::new(noop());
        action.cancel();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        action
            .set_completion_handler(move |outcome| {
                assert_eq!(outcome, ActionOutcome::Canceled);
                fired2.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Copy, Debug)]
        enum Op {
            Invoke,
            Attach,
            Cancel,
        }

        fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
            prop::collection::vec(
                prop_oneof![Just(Op::Invoke), Just(Op::Attach), Just(Op::Cancel)],
                0..12,
            )
        }

        proptest! {
            /// For any interleaving of invoke/attach/cancel, the first
            /// attached handler fires exactly once as soon as the
            /// action has reached a terminal state, and never
            /// otherwise.
            #[test]
            fn handler_fires_exactly_once_iff_attached_and_terminal(ops in arb_ops()) {
                let action = AsyncAction::new(noop());
                let fired = Arc::new(AtomicUsize::new(0));

                for op in &ops {
                    match op {
                        Op::Invoke => {
                            let _ = action.invoke_and_fire_completion();
                        }
                        Op::Attach => {
                            let fired = Arc::clone(&fired);
                            let _ = action.set_completion_handler(move |_| {
                                fired.fetch_add(1, Ordering::SeqCst);
                            });
                        }
                        Op::Cancel => action.cancel(),
                    }
                }

                let attached = ops.iter().any(|op| matches!(op, Op::Attach));
                let terminal = ops
                    .iter()
                    .any(|op| matches!(op, Op::Invoke | Op::Cancel));
                let expected = usize::from(attached && terminal);
                prop_assert_eq!(fired.load(Ordering::SeqCst), expected);
            }
        }
    }
}
