//! Priority dispatch queue: two FIFO lanes feeding a single worker.
//!
//! The worker owns the receiving side exclusively (moved in via
//! `thread::spawn` by [`GameLoopThread`](crate::thread::GameLoopThread),
//! or run inline in tests). No lock is held while a dequeued callback
//! executes; work arrives via unbounded crossbeam lanes, so a running
//! callback may re-enter [`enqueue`](DispatchQueue::enqueue) to
//! resubmit itself without deadlocking.
//!
//! # Drain batches
//!
//! Each loop iteration swaps out the entire pending set of both lanes
//! and executes it as one batch: every pending `Normal` item, in
//! submission order, then every pending `Low` item, in submission
//! order. Work arriving mid-batch lands in the next batch. When both
//! lanes are empty the worker blocks until an enqueue or an exit
//! request wakes it.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use log::{debug, trace, warn};

use cadence_core::{
    AsyncAction, DispatchCallback, DispatchPriority, EnqueueError, TickScheduler,
};

enum Control {
    Exit,
}

struct Shared {
    exit_requested: AtomicBool,
    worker: OnceLock<ThreadId>,
}

/// Thread-safe submitting handle to the dispatch queue.
///
/// Cheap to clone; all clones feed the same worker.
#[derive(Clone)]
pub struct DispatchQueue {
    normal_tx: Sender<AsyncAction>,
    low_tx: Sender<AsyncAction>,
    ctrl_tx: Sender<Control>,
    shared: Arc<Shared>,
}

/// The receiving half of the queue. Consumed by
/// [`run`](DispatchWorker::run) on the dispatch thread.
pub struct DispatchWorker {
    normal_rx: Receiver<AsyncAction>,
    low_rx: Receiver<AsyncAction>,
    ctrl_rx: Receiver<Control>,
    pending_normal: VecDeque<AsyncAction>,
    pending_low: VecDeque<AsyncAction>,
    shared: Arc<Shared>,
}

impl DispatchQueue {
    /// Create a queue and its worker half.
    pub fn channel() -> (DispatchQueue, DispatchWorker) {
        let (normal_tx, normal_rx) = unbounded();
        let (low_tx, low_rx) = unbounded();
        let (ctrl_tx, ctrl_rx) = unbounded();
        let shared = Arc::new(Shared {
            exit_requested: AtomicBool::new(false),
            worker: OnceLock::new(),
        });
        (
            DispatchQueue {
                normal_tx,
                low_tx,
                ctrl_tx,
                shared: Arc::clone(&shared),
            },
            DispatchWorker {
                normal_rx,
                low_rx,
                ctrl_rx,
                pending_normal: VecDeque::new(),
                pending_low: VecDeque::new(),
                shared,
            },
        )
    }

    /// Wrap `callback` in an [`AsyncAction`] and append it to the
    /// priority's FIFO lane, waking the worker if it is idle.
    ///
    /// Never blocks. Fails only with [`EnqueueError::Rejected`] once
    /// [`request_exit`](Self::request_exit) has been called. An enqueue
    /// that races the exit request either gets `Rejected` or has its
    /// action canceled by the worker's final drain; accepted work is
    /// never silently dropped.
    pub fn enqueue(
        &self,
        priority: DispatchPriority,
        callback: DispatchCallback,
    ) -> Result<AsyncAction, EnqueueError> {
        if self.shared.exit_requested.load(Ordering::Acquire) {
            return Err(EnqueueError::Rejected);
        }
        let action = AsyncAction::new(callback);
        let lane = match priority {
            DispatchPriority::Normal => &self.normal_tx,
            DispatchPriority::Low => &self.low_tx,
        };
        lane.send(action.clone())
            .map_err(|_| EnqueueError::Rejected)?;
        Ok(action)
    }

    /// Tell the worker to stop after draining currently queued items.
    /// Idempotent; safe from any thread.
    pub fn request_exit(&self) {
        self.shared.exit_requested.store(true, Ordering::Release);
        // Wake the worker if it is blocked waiting for work. A closed
        // control channel means the worker is already gone.
        let _ = self.ctrl_tx.send(Control::Exit);
    }

    /// True iff called from the thread currently running the dispatch
    /// loop.
    pub fn has_thread_access(&self) -> bool {
        self.shared
            .worker
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }
}

impl TickScheduler for DispatchQueue {
    fn schedule(
        &self,
        priority: DispatchPriority,
        callback: DispatchCallback,
    ) -> Result<AsyncAction, EnqueueError> {
        self.enqueue(priority, callback)
    }
}

impl DispatchWorker {
    /// Run the dispatch loop on the current thread.
    ///
    /// Consumes the worker, so a second concurrent loop is impossible
    /// by construction. Exits once an exit has been requested (or every
    /// submitting handle has been dropped) and no queued items remain;
    /// anything that slipped into the lanes after the final drain is
    /// canceled on the way out.
    pub fn run(mut self) {
        let _ = self.shared.worker.set(thread::current().id());
        trace!("dispatch loop starting");

        loop {
            self.pull_lanes();

            if self.pending_normal.is_empty() && self.pending_low.is_empty() {
                if self.exit_confirmed() {
                    break;
                }
                if self.pending_normal.is_empty() && self.pending_low.is_empty() {
                    self.wait_for_work();
                    // Re-pull both lanes before executing, so the batch
                    // rule (Normal strictly before Low) holds regardless
                    // of which lane woke us.
                    continue;
                }
            }

            self.execute_batch();
        }

        debug!("dispatch loop exiting");
        // Dropping `self` cancels anything that raced past the
        // rejected-flag check in `enqueue`.
    }

    /// Whether the worker may stop: the exit flag is set and both lanes
    /// are confirmed empty by a pull performed *after* observing the
    /// flag. A send sequenced before the exit request is made visible
    /// by the flag's release/acquire pair, so that final pull cannot
    /// miss it; an earlier empty pull is not authoritative.
    fn exit_confirmed(&mut self) -> bool {
        if !self.shared.exit_requested.load(Ordering::Acquire) {
            return false;
        }
        self.pull_lanes();
        self.pending_normal.is_empty() && self.pending_low.is_empty()
    }

    /// Swap everything currently pending out of both lanes.
    fn pull_lanes(&mut self) {
        while let Ok(action) = self.normal_rx.try_recv() {
            self.pending_normal.push_back(action);
        }
        while let Ok(action) = self.low_rx.try_recv() {
            self.pending_low.push_back(action);
        }
    }

    /// Block until an enqueue or exit request arrives.
    ///
    /// A disconnected lane means every `DispatchQueue` clone is gone,
    /// so no further work can ever arrive; treat it as an exit request.
    fn wait_for_work(&mut self) {
        select! {
            recv(self.normal_rx) -> item => match item {
                Ok(action) => self.pending_normal.push_back(action),
                Err(_) => self.shared.exit_requested.store(true, Ordering::Release),
            },
            recv(self.low_rx) -> item => match item {
                Ok(action) => self.pending_low.push_back(action),
                Err(_) => self.shared.exit_requested.store(true, Ordering::Release),
            },
            recv(self.ctrl_rx) -> msg => {
                if msg.is_err() {
                    self.shared.exit_requested.store(true, Ordering::Release);
                }
            }
        }
    }

    fn execute_batch(&mut self) {
        while let Some(action) = self.pending_normal.pop_front() {
            run_action(action);
        }
        while let Some(action) = self.pending_low.pop_front() {
            run_action(action);
        }
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        for action in self.pending_normal.drain(..) {
            action.cancel();
        }
        for action in self.pending_low.drain(..) {
            action.cancel();
        }
        while let Ok(action) = self.normal_rx.try_recv() {
            action.cancel();
        }
        while let Ok(action) = self.low_rx.try_recv() {
            action.cancel();
        }
    }
}

/// Invoke one dequeued action with nothing of the queue held.
///
/// The action already contains callback panics; this guard covers a
/// panicking *completion handler*, which must not take down the
/// dispatch thread either.
fn run_action(action: AsyncAction) {
    match panic::catch_unwind(AssertUnwindSafe(|| action.invoke_and_fire_completion())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!("skipped dispatch item: {err}"),
        Err(_) => warn!("completion handler panicked on the dispatch thread"),
    }
}
