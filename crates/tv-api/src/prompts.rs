//! Handlers for `/prompts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/prompts` | Optional `?subscriber_id=` and `?status=`; oldest first |
//! | `POST` | `/prompts` | Body: [`NewPrompt`]; returns 201 in `pending_review` |
//! | `POST` | `/prompts/dispatch` | Send every scheduled prompt that is now due |
//! | `GET`  | `/prompts/:id` | 404 if not found |
//! | `POST` | `/prompts/:id/schedule` | Body: [`ScheduleRequest`], `{}` for the next open slot |
//! | `POST` | `/prompts/:id/send` | Deliver a scheduled prompt early |
//! | `POST` | `/prompts/:id/complete` | |
//! | `POST` | `/prompts/:id/dismiss` | Archive a prompt still pending review |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tv_core::{
  Pipeline,
  notify::Notifier,
  pipeline::ScheduleRequest,
  prompt::{NewPrompt, Prompt, PromptStatus},
  store::{PipelineStore, PromptQuery},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subscriber_id: Option<Uuid>,
  pub status:        Option<PromptStatus>,
}

/// `GET /prompts[?subscriber_id=<id>][&status=<status>]`
pub async fn list<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Prompt>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  let query = PromptQuery {
    subscriber_id: params.subscriber_id,
    status:        params.status,
  };
  let prompts = pipeline
    .store()
    .list_prompts(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(prompts))
}

// ─── Create / get ────────────────────────────────────────────────────────────

/// `POST /prompts`
pub async fn create<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Json(body): Json<NewPrompt>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  if body.question.trim().is_empty() {
    return Err(ApiError::BadRequest("question must not be empty".into()));
  }
  let prompt = pipeline.create_prompt(body).await?;
  Ok((StatusCode::CREATED, Json(prompt)))
}

/// `GET /prompts/:id`
pub async fn get_one<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Prompt>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.prompt(id).await?))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /prompts/:id/schedule`
pub async fn schedule<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleRequest>,
) -> Result<Json<Prompt>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.schedule(id, body).await?))
}

/// `POST /prompts/:id/send`
pub async fn deliver_now<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Prompt>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.deliver_now(id).await?))
}

/// `POST /prompts/:id/complete`
pub async fn complete<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Prompt>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.complete(id).await?))
}

/// `POST /prompts/:id/dismiss`
pub async fn dismiss<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Prompt>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.dismiss(id).await?))
}

/// `POST /prompts/dispatch`; returns the prompts that were sent.
pub async fn dispatch_due<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
) -> Result<Json<Vec<Prompt>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.dispatch_due().await?))
}
