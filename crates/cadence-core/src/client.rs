//! The game-loop client capability set.

/// Callbacks implemented by the consumer of a game loop thread.
///
/// All methods are invoked from the dispatch thread except
/// [`on_game_loop_stopped`](GameLoopClient::on_game_loop_stopped),
/// which runs on the thread that drops the `GameLoopThread`, strictly
/// after the dispatch thread has been joined. Implementations must
/// therefore be `Send + Sync`.
pub trait GameLoopClient: Send + Sync + 'static {
    /// The opaque surface being rendered into. The dispatcher never
    /// inspects it; it is handed back to [`tick`](GameLoopClient::tick).
    type Target: Send + Sync + 'static;

    /// Called on the dispatch thread before any submitted callback or
    /// tick executes.
    fn on_game_loop_starting(&self);

    /// Called after the dispatch loop has fully exited and the worker
    /// thread has been joined. Never concurrent with a tick.
    fn on_game_loop_stopped(&self);

    /// One frame of client work. Return `true` to keep the tick loop
    /// running, `false` to end it.
    fn tick(&self, target: &Self::Target, resources_created: bool) -> bool;

    /// Called exactly once when a tick session ends, whether the client
    /// refused to continue or the dispatcher was stopped.
    fn on_tick_loop_ended(&self);
}
