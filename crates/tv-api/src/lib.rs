//! JSON REST API for ThoughtVoice.
//!
//! Exposes an axum [`Router`] over a shared [`Pipeline`]. Every pipeline and
//! scheduler operation has an endpoint here. Auth, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tv_api::api_router(pipeline.clone()))
//! ```

pub mod content;
pub mod error;
pub mod prompts;
pub mod subscribers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use tv_core::{Pipeline, notify::Notifier, store::PipelineStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(pipeline: Arc<Pipeline<S, N>>) -> Router<()>
where
  S: PipelineStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Subscribers
    .route(
      "/subscribers",
      get(subscribers::list::<S, N>).post(subscribers::create::<S, N>),
    )
    .route("/subscribers/{id}", get(subscribers::get_one::<S, N>))
    .route("/subscribers/{id}/onboard", post(subscribers::onboard::<S, N>))
    .route("/subscribers/{id}/schedule", put(subscribers::set_schedule::<S, N>))
    .route("/subscribers/{id}/status", put(subscribers::set_status::<S, N>))
    .route("/subscribers/{id}/forecast", get(subscribers::forecast::<S, N>))
    .route("/subscribers/{id}/activity", get(subscribers::activity::<S, N>))
    // Prompts
    .route("/prompts", get(prompts::list::<S, N>).post(prompts::create::<S, N>))
    .route("/prompts/dispatch", post(prompts::dispatch_due::<S, N>))
    .route("/prompts/{id}", get(prompts::get_one::<S, N>))
    .route("/prompts/{id}/schedule", post(prompts::schedule::<S, N>))
    .route("/prompts/{id}/send", post(prompts::deliver_now::<S, N>))
    .route("/prompts/{id}/complete", post(prompts::complete::<S, N>))
    .route("/prompts/{id}/dismiss", post(prompts::dismiss::<S, N>))
    // Content items
    .route("/content", get(content::list::<S, N>).post(content::submit::<S, N>))
    .route("/content/{id}", get(content::get_one::<S, N>))
    .route("/content/{id}/assign", post(content::assign::<S, N>))
    .route("/content/{id}/editor-response", post(content::editor_response::<S, N>))
    .route("/content/{id}/review", post(content::send_to_review::<S, N>))
    .route("/content/{id}/approve", post(content::approve::<S, N>))
    .route("/content/{id}/reject", post(content::reject::<S, N>))
    .route("/content/{id}/client-reject", post(content::client_reject::<S, N>))
    .route("/content/{id}/publish", post(content::publish::<S, N>))
    .route("/content/{id}/notes", post(content::add_note::<S, N>))
    .with_state(pipeline)
}
