//! Cadence quickstart: a complete, minimal game loop from scratch.
//!
//! Demonstrates:
//!   1. Implementing `GameLoopClient` for a renderer
//!   2. Spinning up a `GameLoopThread` for a render target
//!   3. Starting the low-priority tick loop
//!   4. Interleaving Normal-priority work (stand-in for input events)
//!   5. Observing completion through an `AsyncAction`
//!
//! Run with:
//!   cargo run --example quickstart

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_core::GameLoopClient;
use cadence_loop::GameLoopThread;

/// The surface being rendered into. The dispatcher never looks inside.
struct Surface {
    width: u32,
    height: u32,
}

struct Renderer {
    frames: AtomicUsize,
}

impl GameLoopClient for Renderer {
    type Target = Surface;

    fn on_game_loop_starting(&self) {
        println!("game loop starting");
    }

    fn on_game_loop_stopped(&self) {
        println!("game loop stopped");
    }

    fn tick(&self, target: &Surface, resources_created: bool) -> bool {
        let frame = self.frames.fetch_add(1, Ordering::SeqCst);
        println!(
            "frame {frame} into {}x{} (resources created: {resources_created})",
            target.width, target.height
        );
        // Render ten frames, then let the loop wind down.
        frame < 9
    }

    fn on_tick_loop_ended(&self) {
        println!("tick loop ended");
    }
}

fn main() {
    let renderer = Arc::new(Renderer {
        frames: AtomicUsize::new(0),
    });
    let thread = GameLoopThread::new(
        Surface {
            width: 1280,
            height: 720,
        },
        Arc::clone(&renderer),
    );

    thread.set_resources_created(true);
    thread.start_dispatcher();

    // Input events share the dispatch thread at Normal priority, so
    // they are drained ahead of queued ticks.
    let action = thread
        .run_async(|| {
            println!("input event handled between frames");
            Ok(())
        })
        .expect("dispatch thread is up");
    action
        .set_completion_handler(|outcome| {
            println!("input event outcome: {outcome:?}");
        })
        .expect("first handler attach");

    // Let the ten frames render.
    while renderer.frames.load(Ordering::SeqCst) < 10 {
        std::thread::sleep(Duration::from_millis(1));
    }

    // Dropping the thread stops the dispatcher, drains the queue,
    // joins the worker, and fires the stopped notification.
}
