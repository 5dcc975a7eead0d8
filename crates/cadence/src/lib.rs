//! Cadence: a priority-aware game-loop dispatcher for a dedicated
//! render thread.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Cadence sub-crates. For most users, adding `cadence` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use cadence::prelude::*;
//!
//! // The surface being rendered into. Opaque to the dispatcher.
//! struct Surface;
//!
//! struct Renderer {
//!     frames: AtomicUsize,
//! }
//!
//! impl GameLoopClient for Renderer {
//!     type Target = Surface;
//!
//!     fn on_game_loop_starting(&self) {}
//!     fn on_game_loop_stopped(&self) {}
//!
//!     fn tick(&self, _target: &Surface, _resources_created: bool) -> bool {
//!         // Render one frame; stop after three.
//!         self.frames.fetch_add(1, Ordering::SeqCst) < 2
//!     }
//!
//!     fn on_tick_loop_ended(&self) {}
//! }
//!
//! let renderer = Arc::new(Renderer { frames: AtomicUsize::new(0) });
//! let thread = GameLoopThread::new(Surface, Arc::clone(&renderer));
//!
//! thread.start_dispatcher();
//! while renderer.frames.load(Ordering::SeqCst) < 3 {
//!     std::thread::sleep(Duration::from_millis(1));
//! }
//!
//! // Normal-priority work shares the same thread and outranks ticks.
//! let action = thread.run_async(|| Ok(())).unwrap();
//! action.set_completion_handler(|outcome| {
//!     assert!(outcome.is_success());
//! }).unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | Priorities, outcomes, errors, the client trait |
//! | [`dispatch`] | `cadence-loop` | Queue, worker, game loop thread, tick session |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types: priorities, action outcomes, errors, and traits.
pub mod types {
    pub use cadence_core::{
        ActionError, ActionOutcome, ActionStatus, AsyncAction, CallbackError, CompletionHandler,
        DispatchCallback, DispatchPriority, EnqueueError, GameLoopClient, TickScheduler,
    };
}

/// The dispatch queue, worker, game loop thread, and tick session.
pub mod dispatch {
    pub use cadence_loop::{DispatchQueue, DispatchWorker, GameLoopThread, TickSession};
}

/// The commonly used subset of the API.
pub mod prelude {
    pub use cadence_core::{
        ActionOutcome, ActionStatus, AsyncAction, CallbackError, DispatchPriority, EnqueueError,
        GameLoopClient,
    };
    pub use cadence_loop::GameLoopThread;
}
