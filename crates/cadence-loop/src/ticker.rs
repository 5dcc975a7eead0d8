//! Self-resubmitting tick loop driver.
//!
//! A [`TickSession`] repeatedly schedules a low-priority tick action,
//! asks the client whether to continue, and terminates cleanly when
//! the client refuses, [`stop`](TickSession::stop) is called, or the
//! scheduler rejects further work.
//!
//! Resubmission rides on the action's completion handler rather than
//! happening inside the tick callback, so a tick that completes on the
//! dispatch thread *before* the handler is attached is handled by the
//! action's immediate-fire rule, with no special-casing here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use cadence_core::{ActionOutcome, DispatchPriority, GameLoopClient, TickScheduler};

/// One run of the tick loop: alive from `start_dispatcher` until the
/// client signals stop, [`stop`](TickSession::stop) is called, or the
/// dispatcher goes away.
pub struct TickSession<C: GameLoopClient> {
    scheduler: Arc<dyn TickScheduler>,
    client: Arc<C>,
    target: Arc<C::Target>,
    resources_created: bool,
    /// Continue-decision of the most recent tick, written by the tick
    /// callback and read by its completion handler.
    keep_ticking: AtomicBool,
    stopped: AtomicBool,
    ended: AtomicBool,
}

impl<C: GameLoopClient> TickSession<C> {
    /// Construct a session without submitting anything.
    ///
    /// Construction and [`start`](Self::start) are separate so a caller
    /// can publish the session (for example into a lock-guarded slot)
    /// and release its own locks before the first tick runs: the first
    /// tick's completion handler can fire synchronously inside `start`,
    /// re-entering client code.
    pub fn new(
        scheduler: Arc<dyn TickScheduler>,
        client: Arc<C>,
        target: Arc<C::Target>,
        resources_created: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            client,
            target,
            resources_created,
            keep_ticking: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        })
    }

    /// Submit the first tick action at
    /// [`Low`](DispatchPriority::Low) priority.
    pub fn start(session: &Arc<Self>) {
        trace!("tick session starting");
        Self::schedule_tick(session);
    }

    /// Construct a session and immediately submit its first tick.
    pub fn begin(
        scheduler: Arc<dyn TickScheduler>,
        client: Arc<C>,
        target: Arc<C::Target>,
        resources_created: bool,
    ) -> Arc<Self> {
        let session = Self::new(scheduler, client, target, resources_created);
        Self::start(&session);
        session
    }

    /// Stop resubmitting ticks. Cooperative: a tick already in flight
    /// completes normally but does not trigger a further resubmission.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Whether the session has fired its end-of-loop notification.
    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    fn schedule_tick(session: &Arc<Self>) {
        let tick_session = Arc::clone(session);
        let tick = Box::new(move || {
            let keep = tick_session
                .client
                .tick(&tick_session.target, tick_session.resources_created);
            tick_session.keep_ticking.store(keep, Ordering::Release);
            Ok(())
        });

        let action = match session.scheduler.schedule(DispatchPriority::Low, tick) {
            Ok(action) => action,
            Err(err) => {
                debug!("tick submission rejected: {err}");
                session.end();
                return;
            }
        };

        // The tick may already have run and completed on the dispatch
        // thread; attach-after-complete fires right here on this thread
        // instead of losing the notification.
        let completion_session = Arc::clone(session);
        let attached = action
            .set_completion_handler(move |outcome| completion_session.tick_completed(outcome));
        debug_assert!(attached.is_ok(), "freshly scheduled action had a handler");
    }

    fn tick_completed(self: Arc<Self>, outcome: ActionOutcome) {
        let keep = outcome.is_success()
            && self.keep_ticking.load(Ordering::Acquire)
            && !self.is_stopped();
        if keep {
            Self::schedule_tick(&self);
        } else {
            self.end();
        }
    }

    /// Fire `on_tick_loop_ended` exactly once per session.
    fn end(&self) {
        if !self.ended.swap(true, Ordering::AcqRel) {
            debug!("tick loop ended");
            self.client.on_tick_loop_ended();
        }
    }
}
