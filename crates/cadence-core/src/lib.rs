//! Core types and traits for the Cadence game-loop dispatcher.
//!
//! This is the leaf crate with zero dependencies. It defines the
//! fundamental abstractions used throughout the Cadence workspace:
//! the dispatch priority lanes, the one-shot [`AsyncAction`] primitive
//! with its outcome value types, the game-loop client trait, the
//! scheduler seam, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod client;
pub mod error;
pub mod outcome;
pub mod priority;
pub mod scheduler;

pub use action::AsyncAction;
pub use client::GameLoopClient;
pub use error::{ActionError, CallbackError, EnqueueError};
pub use outcome::{ActionOutcome, ActionStatus, CompletionHandler, DispatchCallback};
pub use priority::DispatchPriority;
pub use scheduler::TickScheduler;
