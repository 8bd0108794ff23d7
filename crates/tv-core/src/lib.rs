//! Core types and trait definitions for the ThoughtVoice production service.
//!
//! Two pieces carry the real invariants: the delivery [`schedule`] module,
//! which picks eligible calendar days for a subscriber's cadence, and the
//! [`pipeline`], which moves prompts and content items through their status
//! machines. Everything else here is the collaborator contracts they lean on.
//!
//! This crate has no HTTP or database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod clock;
pub mod content;
pub mod error;
pub mod lock;
pub mod memory;
pub mod notify;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod schedule;
pub mod store;
pub mod subscriber;

pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineConfig};
