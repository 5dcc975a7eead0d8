//! Scheduling seam between the tick loop and the dispatch queue.

use crate::action::AsyncAction;
use crate::error::EnqueueError;
use crate::outcome::DispatchCallback;
use crate::priority::DispatchPriority;

/// Something that can place a callback on a dispatch thread.
///
/// The tick loop driver depends on this trait rather than on the
/// concrete queue, so tests can substitute a scheduler that records
/// submission priorities or invokes actions synchronously.
pub trait TickScheduler: Send + Sync + 'static {
    /// Wrap `callback` in an [`AsyncAction`], queue it at `priority`,
    /// and return the action so the caller can observe completion.
    ///
    /// Fails only with [`EnqueueError::Rejected`] once the underlying
    /// queue has been told to exit.
    fn schedule(
        &self,
        priority: DispatchPriority,
        callback: DispatchCallback,
    ) -> Result<AsyncAction, EnqueueError>;
}
