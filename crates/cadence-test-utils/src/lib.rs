//! Test fixtures and mock types for Cadence development.
//!
//! Two families of fixtures:
//!
//! - [`MockGameLoopClient`]: a counting [`GameLoopClient`] with a
//!   configurable continue budget and poll-based waiting helpers.
//! - [`ImmediateScheduler`] / [`RecordingScheduler`]: [`TickScheduler`]
//!   substitutes for driving the tick loop without a dispatch thread:
//!   synchronous invocation (to provoke the attach-after-complete race)
//!   and priority recording.
//!
//! [`GameLoopClient`]: cadence_core::GameLoopClient
//! [`TickScheduler`]: cadence_core::TickScheduler

#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod client;
mod scheduler;

pub use client::{MockGameLoopClient, WaitTimeout};
pub use scheduler::{ImmediateScheduler, RecordingScheduler};
