//! SQLite backend for the ThoughtVoice pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The same store doubles as a
//! [`Notifier`](tv_core::notify::Notifier): notifications are written to an
//! outbox table for a delivery worker to pick up.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
