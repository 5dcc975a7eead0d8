//! Priority dispatch queue and game-loop thread for Cadence.
//!
//! The [`GameLoopThread`] owns one dedicated dispatch thread that
//! interleaves externally submitted Normal-priority callbacks with a
//! self-resubmitting Low-priority tick loop, so shared input work is
//! always drained before the next frame.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod queue;
pub mod thread;
pub mod ticker;

pub use queue::{DispatchQueue, DispatchWorker};
pub use thread::GameLoopThread;
pub use ticker::TickSession;
