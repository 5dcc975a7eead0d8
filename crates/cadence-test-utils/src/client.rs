//! Counting mock implementation of [`GameLoopClient`].

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use cadence_core::GameLoopClient;

/// A poll-based wait on the mock gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitTimeout;

impl std::fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out waiting on mock client")
    }
}

impl std::error::Error for WaitTimeout {}

/// A [`GameLoopClient`] that counts every callback and lets tests
/// budget how many ticks ask to continue.
///
/// By default `tick` returns `true` forever. [`continue_for`]
/// limits that: the first `n` ticks continue, every later tick refuses.
///
/// The waiting helpers poll with a deadline rather than blocking on a
/// synchronization primitive, so they can be used from the same thread
/// that drives a synchronous scheduler.
///
/// [`continue_for`]: MockGameLoopClient::continue_for
#[derive(Default)]
pub struct MockGameLoopClient {
    starting: AtomicUsize,
    stopped: AtomicUsize,
    ticks: AtomicUsize,
    tick_loop_ended: AtomicUsize,
    /// Remaining continue budget; negative means unlimited.
    continue_budget: AtomicI64,
    last_resources_created: AtomicBool,
    saw_tick: AtomicBool,
    /// Ordered log of every callback, for ordering assertions.
    events: Mutex<Vec<&'static str>>,
}

impl MockGameLoopClient {
    /// A fresh mock with an unlimited continue budget.
    pub fn new() -> Self {
        Self {
            continue_budget: AtomicI64::new(-1),
            ..Self::default()
        }
    }

    /// Continue for the first `n` ticks, refuse afterwards.
    pub fn continue_for(&self, n: usize) {
        self.continue_budget.store(n as i64, Ordering::SeqCst);
    }

    /// Number of `on_game_loop_starting` calls observed.
    pub fn starting_calls(&self) -> usize {
        self.starting.load(Ordering::SeqCst)
    }

    /// Number of `on_game_loop_stopped` calls observed.
    pub fn stopped_calls(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of ticks observed.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Number of `on_tick_loop_ended` calls observed.
    pub fn tick_loop_ended_calls(&self) -> usize {
        self.tick_loop_ended.load(Ordering::SeqCst)
    }

    /// The `resources_created` flag passed to the most recent tick, if
    /// any tick ran.
    pub fn last_resources_created(&self) -> Option<bool> {
        if self.saw_tick.load(Ordering::SeqCst) {
            Some(self.last_resources_created.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    /// The callback order observed so far (`"starting"`, `"tick"`,
    /// `"tick-loop-ended"`, `"stopped"`).
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    /// Poll until at least `n` ticks have run.
    pub fn wait_for_ticks(&self, n: usize, timeout: Duration) -> Result<(), WaitTimeout> {
        self.wait_until(timeout, || self.ticks() >= n)
    }

    /// Poll until `on_tick_loop_ended` has fired.
    pub fn wait_for_tick_loop_end(&self, timeout: Duration) -> Result<(), WaitTimeout> {
        self.wait_until(timeout, || self.tick_loop_ended_calls() > 0)
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn() -> bool) -> Result<(), WaitTimeout> {
        let deadline = Instant::now() + timeout;
        while !done() {
            if Instant::now() > deadline {
                return Err(WaitTimeout);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl GameLoopClient for MockGameLoopClient {
    type Target = ();

    fn on_game_loop_starting(&self) {
        self.record("starting");
        self.starting.fetch_add(1, Ordering::SeqCst);
    }

    fn on_game_loop_stopped(&self) {
        self.record("stopped");
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn tick(&self, _target: &Self::Target, resources_created: bool) -> bool {
        self.record("tick");
        self.last_resources_created
            .store(resources_created, Ordering::SeqCst);
        self.saw_tick.store(true, Ordering::SeqCst);
        self.ticks.fetch_add(1, Ordering::SeqCst);

        let budget = self.continue_budget.load(Ordering::SeqCst);
        if budget < 0 {
            return true; // unlimited
        }
        if budget == 0 {
            return false;
        }
        self.continue_budget.fetch_sub(1, Ordering::SeqCst);
        true
    }

    fn on_tick_loop_ended(&self) {
        self.record("tick-loop-ended");
        self.tick_loop_ended.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_always_continues() {
        let client = MockGameLoopClient::new();
        for _ in 0..100 {
            assert!(client.tick(&(), false));
        }
        assert_eq!(client.ticks(), 100);
    }

    #[test]
    fn budget_counts_down_to_refusal() {
        let client = MockGameLoopClient::new();
        client.continue_for(2);
        assert!(client.tick(&(), false));
        assert!(client.tick(&(), false));
        assert!(!client.tick(&(), false));
        assert!(!client.tick(&(), false));
    }

    #[test]
    fn event_order_is_recorded() {
        let client = MockGameLoopClient::new();
        client.on_game_loop_starting();
        client.tick(&(), true);
        client.on_tick_loop_ended();
        client.on_game_loop_stopped();
        assert_eq!(
            client.events(),
            vec!["starting", "tick", "tick-loop-ended", "stopped"]
        );
        assert_eq!(client.last_resources_created(), Some(true));
    }

    #[test]
    fn wait_times_out() {
        let client = MockGameLoopClient::new();
        assert_eq!(
            client.wait_for_ticks(1, Duration::from_millis(10)),
            Err(WaitTimeout)
        );
    }
}
