//! [`TickScheduler`] substitutes for driving the tick loop without a
//! dispatch thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cadence_core::{
    AsyncAction, DispatchCallback, DispatchPriority, EnqueueError, TickScheduler,
};

/// Invokes scheduled actions synchronously, inside `schedule` itself.
///
/// This reproduces the race where an action completes on the dispatch
/// thread before the submitter attaches its completion handler: by the
/// time `schedule` returns, the action is already `Completed`, so the
/// attach must take the immediate-fire path.
pub struct ImmediateScheduler {
    /// If true, only the first scheduled action is invoked; later ones
    /// are returned still `Created` and parked here.
    first_only: bool,
    invoked_first: AtomicBool,
    parked: Mutex<Vec<AsyncAction>>,
}

impl ImmediateScheduler {
    /// Invoke every scheduled action synchronously.
    pub fn all() -> Self {
        Self {
            first_only: false,
            invoked_first: AtomicBool::new(false),
            parked: Mutex::new(Vec::new()),
        }
    }

    /// Invoke only the first scheduled action synchronously; park the
    /// rest untouched.
    pub fn first_only() -> Self {
        Self {
            first_only: true,
            invoked_first: AtomicBool::new(false),
            parked: Mutex::new(Vec::new()),
        }
    }

    /// Actions that were scheduled but deliberately not invoked.
    pub fn parked(&self) -> Vec<AsyncAction> {
        self.parked.lock().unwrap().clone()
    }
}

impl TickScheduler for ImmediateScheduler {
    fn schedule(
        &self,
        _priority: DispatchPriority,
        callback: DispatchCallback,
    ) -> Result<AsyncAction, EnqueueError> {
        let action = AsyncAction::new(callback);
        let skip = self.first_only && self.invoked_first.swap(true, Ordering::SeqCst);
        if skip {
            self.parked.lock().unwrap().push(action.clone());
        } else {
            // Completes before the caller can attach a handler.
            let _ = action.invoke_and_fire_completion();
        }
        Ok(action)
    }
}

/// Records the priority of every submission, then forwards to an inner
/// scheduler.
pub struct RecordingScheduler {
    inner: Arc<dyn TickScheduler>,
    priorities: Mutex<Vec<DispatchPriority>>,
}

impl RecordingScheduler {
    /// Wrap `inner`, recording each submission's priority.
    pub fn new(inner: Arc<dyn TickScheduler>) -> Self {
        Self {
            inner,
            priorities: Mutex::new(Vec::new()),
        }
    }

    /// Priorities observed so far, in submission order.
    pub fn priorities(&self) -> Vec<DispatchPriority> {
        self.priorities.lock().unwrap().clone()
    }
}

impl TickScheduler for RecordingScheduler {
    fn schedule(
        &self,
        priority: DispatchPriority,
        callback: DispatchCallback,
    ) -> Result<AsyncAction, EnqueueError> {
        self.priorities.lock().unwrap().push(priority);
        self.inner.schedule(priority, callback)
    }
}
