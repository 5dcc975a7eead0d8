//! The game loop thread: dispatch queue, worker thread lifecycle, and
//! tick session control.
//!
//! The worker thread lives for the whole `GameLoopThread` lifetime
//! (spawned in [`new`](GameLoopThread::new), joined in `Drop`). The
//! tick loop's state is independent: [`start_dispatcher`] and
//! [`stop_dispatcher`] toggle tick resubmission without touching the
//! thread, so externally submitted work keeps running after the ticks
//! stop.
//!
//! [`start_dispatcher`]: GameLoopThread::start_dispatcher
//! [`stop_dispatcher`]: GameLoopThread::stop_dispatcher

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use cadence_core::{
    AsyncAction, CallbackError, DispatchPriority, EnqueueError, GameLoopClient, TickScheduler,
};

use crate::queue::DispatchQueue;
use crate::ticker::TickSession;

const DISPATCH_THREAD_NAME: &str = "cadence-dispatch";

/// A dedicated dispatch thread shared between externally submitted
/// work and a recurring low-priority tick loop.
///
/// Exactly one worker thread per instance. Construction is
/// unconditional: the thread comes up and issues
/// [`on_game_loop_starting`](GameLoopClient::on_game_loop_starting)
/// on itself, strictly before any queued callback runs, even if that
/// hook panics.
pub struct GameLoopThread<C: GameLoopClient> {
    queue: DispatchQueue,
    worker: Option<JoinHandle<()>>,
    client: Arc<C>,
    target: Arc<C::Target>,
    resources_created: AtomicBool,
    session: Mutex<Option<Arc<TickSession<C>>>>,
}

impl<C: GameLoopClient> GameLoopThread<C> {
    /// Spawn the dispatch thread for `target`, notifying `client`.
    pub fn new(target: C::Target, client: Arc<C>) -> Self {
        let (queue, worker) = DispatchQueue::channel();

        let starting_client = Arc::clone(&client);
        let handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.into())
            .spawn(move || {
                // A "starting" hook that panics (e.g. a client that
                // fails to initialize its input source) must not leave
                // the dispatch loop unreachable; construction still
                // counts.
                if panic::catch_unwind(AssertUnwindSafe(|| {
                    starting_client.on_game_loop_starting()
                }))
                .is_err()
                {
                    warn!("on_game_loop_starting panicked; dispatch loop continuing");
                }
                worker.run();
            })
            .expect("failed to spawn dispatch thread");

        Self {
            queue,
            worker: Some(handle),
            client,
            target: Arc::new(target),
            resources_created: AtomicBool::new(false),
            session: Mutex::new(None),
        }
    }

    /// Schedule `callback` on the dispatch thread at
    /// [`Normal`](DispatchPriority::Normal) priority.
    ///
    /// Returns the wrapping [`AsyncAction`] so the caller can attach a
    /// completion handler or query the outcome. Normal-priority work is
    /// independent of the tick driver: it still runs after
    /// [`stop_dispatcher`](Self::stop_dispatcher).
    pub fn run_async<F>(&self, callback: F) -> Result<AsyncAction, EnqueueError>
    where
        F: FnOnce() -> Result<(), CallbackError> + Send + 'static,
    {
        self.queue
            .enqueue(DispatchPriority::Normal, Box::new(callback))
    }

    /// Start the tick loop by submitting the first tick action at
    /// [`Low`](DispatchPriority::Low) priority.
    ///
    /// Idempotent while a session is live; once the previous session
    /// has stopped or ended, a new call starts a fresh one.
    pub fn start_dispatcher(&self) {
        let session = {
            let mut slot = self.session.lock().unwrap();
            if let Some(live) = slot.as_ref() {
                if !live.is_stopped() && !live.has_ended() {
                    return;
                }
            }
            debug!("starting tick dispatcher");
            let session = TickSession::new(
                Arc::new(self.queue.clone()) as Arc<dyn TickScheduler>,
                Arc::clone(&self.client),
                Arc::clone(&self.target),
                self.resources_created.load(Ordering::Acquire),
            );
            *slot = Some(Arc::clone(&session));
            session
        };
        // The first tick is submitted with the session lock released.
        // Its completion handler can fire synchronously right here (the
        // tick may already have run, or the submission may be rejected),
        // and the end-of-loop hook may re-enter start/stop_dispatcher.
        TickSession::start(&session);
    }

    /// Stop resubmitting ticks.
    ///
    /// Cooperative: a tick already in flight completes normally, and
    /// previously queued Normal-priority work still runs. The worker
    /// thread itself keeps going until the `GameLoopThread` is dropped.
    pub fn stop_dispatcher(&self) {
        if let Some(session) = self.session.lock().unwrap().as_ref() {
            debug!("stopping tick dispatcher");
            session.stop();
        }
    }

    /// Record whether device resources exist. The flag is handed to
    /// every tick of the *next* session started by
    /// [`start_dispatcher`](Self::start_dispatcher).
    pub fn set_resources_created(&self, created: bool) {
        self.resources_created.store(created, Ordering::Release);
    }

    /// True iff called from the dispatch thread.
    pub fn has_thread_access(&self) -> bool {
        self.queue.has_thread_access()
    }
}

impl<C: GameLoopClient> Drop for GameLoopThread<C> {
    /// Stops the tick loop, drains the queue, joins the worker, and
    /// only then fires
    /// [`on_game_loop_stopped`](GameLoopClient::on_game_loop_stopped)
    /// on the dropping thread, so no tick can execute after (or
    /// concurrently with) the stopped notification.
    fn drop(&mut self) {
        // Joining the dispatch thread from itself would deadlock; the
        // thread must be dropped from outside its own callbacks.
        debug_assert!(
            !self.queue.has_thread_access(),
            "GameLoopThread dropped on its own dispatch thread"
        );

        self.stop_dispatcher();
        self.queue.request_exit();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("dispatch thread terminated abnormally");
            }
        }
        self.client.on_game_loop_stopped();
    }
}
