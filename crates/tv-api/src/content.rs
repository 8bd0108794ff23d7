//! Handlers for `/content` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/content` | Optional `?subscriber_id=` and `?status=`; newest first |
//! | `POST` | `/content` | Body: [`NewContentItem`]; returns 201 |
//! | `GET`  | `/content/:id` | 404 if not found |
//! | `POST` | `/content/:id/assign` | Body: `{"editor_id":"..."}` |
//! | `POST` | `/content/:id/editor-response` | Body: `{"accepted":true}` |
//! | `POST` | `/content/:id/review` | Notifies the subscriber |
//! | `POST` | `/content/:id/approve` | Body: `{"approved_by":"..."}` |
//! | `POST` | `/content/:id/reject` | Body: `{"reason":"...","author":"..."}` |
//! | `POST` | `/content/:id/client-reject` | Body: `{"reason":"..."}` |
//! | `POST` | `/content/:id/publish` | |
//! | `POST` | `/content/:id/notes` | Body: `{"text":"...","author":"..."}` |

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
  content::{ContentItem, ContentStatus, NewContentItem},
  notify::Notifier,
  store::{ContentQuery, PipelineStore},
};
use uuid::Uuid;

use crate::error::ApiError;

fn required(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }
  Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subscriber_id: Option<Uuid>,
  pub status:        Option<ContentStatus>,
}

/// `GET /content[?subscriber_id=<id>][&status=<status>]`
pub async fn list<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ContentItem>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  let query = ContentQuery {
    subscriber_id: params.subscriber_id,
    status:        params.status,
  };
  let items = pipeline
    .store()
    .list_content(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── Submit / get ────────────────────────────────────────────────────────────

/// `POST /content`
pub async fn submit<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Json(body): Json<NewContentItem>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("title", &body.title)?;
  let item = pipeline.submit_capture(body).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /content/:id`
pub async fn get_one<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.content(id).await?))
}

// ─── Editing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub editor_id: String,
}

/// `POST /content/:id/assign`
pub async fn assign<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("editor_id", &body.editor_id)?;
  Ok(Json(pipeline.assign_editor(id, body.editor_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct EditorResponseBody {
  pub accepted: bool,
}

/// `POST /content/:id/editor-response`
pub async fn editor_response<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<EditorResponseBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.editor_respond(id, body.accepted).await?))
}

/// `POST /content/:id/review`
pub async fn send_to_review<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.send_to_review(id).await?))
}

// ─── Review outcome ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub approved_by: String,
}

/// `POST /content/:id/approve`
pub async fn approve<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ApproveBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("approved_by", &body.approved_by)?;
  Ok(Json(pipeline.approve(id, body.approved_by).await?))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub reason: String,
  /// Defaults to `"qa"`.
  pub author: Option<String>,
}

/// `POST /content/:id/reject`
pub async fn reject<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("reason", &body.reason)?;
  let author = body.author.unwrap_or_else(|| "qa".to_owned());
  Ok(Json(pipeline.reject(id, body.reason, author).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClientRejectBody {
  pub reason: String,
}

/// `POST /content/:id/client-reject`
pub async fn client_reject<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ClientRejectBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("reason", &body.reason)?;
  Ok(Json(pipeline.client_reject(id, body.reason).await?))
}

/// `POST /content/:id/publish`
pub async fn publish<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.publish(id).await?))
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteBody {
  pub text:   String,
  pub author: String,
}

/// `POST /content/:id/notes`
pub async fn add_note<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NoteBody>,
) -> Result<Json<ContentItem>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  required("text", &body.text)?;
  Ok(Json(pipeline.add_note(id, body.text, body.author).await?))
}
