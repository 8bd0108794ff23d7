//! Handlers for `/subscribers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subscribers` | All subscribers |
//! | `POST` | `/subscribers` | Body: [`NewSubscriber`]; returns 201 |
//! | `GET`  | `/subscribers/:id` | 404 if not found |
//! | `POST` | `/subscribers/:id/onboard` | Idempotent; sends the welcome email once |
//! | `PUT`  | `/subscribers/:id/schedule` | Body: `{"schedule":"twice_per_week"}` |
//! | `PUT`  | `/subscribers/:id/status` | Body: `{"status":"paused"}` |
//! | `GET`  | `/subscribers/:id/forecast` | Optional `?days=N` (default 14) |
//! | `GET`  | `/subscribers/:id/activity` | Newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tv_core::{
  Pipeline,
  activity::ActivityEntry,
  notify::Notifier,
  schedule::ScheduleFrequency,
  store::PipelineStore,
  subscriber::{CustomerStatus, NewSubscriber, Subscriber},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List / create / get ─────────────────────────────────────────────────────

/// `GET /subscribers`
pub async fn list<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
) -> Result<Json<Vec<Subscriber>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.list_subscribers().await?))
}

/// `POST /subscribers`
pub async fn create<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Json(body): Json<NewSubscriber>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }
  let subscriber = pipeline.create_subscriber(body).await?;
  Ok((StatusCode::CREATED, Json(subscriber)))
}

/// `GET /subscribers/:id`
pub async fn get_one<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subscriber>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.subscriber(id).await?))
}

// ─── Profile changes ─────────────────────────────────────────────────────────

/// `POST /subscribers/:id/onboard`
pub async fn onboard<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subscriber>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.complete_onboarding(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
  pub schedule: ScheduleFrequency,
}

/// `PUT /subscribers/:id/schedule`
pub async fn set_schedule<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleBody>,
) -> Result<Json<Subscriber>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.set_schedule(id, body.schedule).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: CustomerStatus,
}

/// `PUT /subscribers/:id/status`
pub async fn set_status<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Subscriber>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  Ok(Json(pipeline.set_customer_status(id, body.status).await?))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
  pub days: Option<u32>,
}

/// `GET /subscribers/:id/forecast[?days=N]`
pub async fn forecast<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ForecastParams>,
) -> Result<Json<Vec<NaiveDate>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  let days = params.days.unwrap_or(pipeline.config().welcome_forecast_days);
  if days > pipeline.scheduler().horizon_days() {
    return Err(ApiError::BadRequest(format!(
      "forecast is limited to {} days",
      pipeline.scheduler().horizon_days()
    )));
  }
  Ok(Json(pipeline.forecast(id, days).await?))
}

/// `GET /subscribers/:id/activity`
pub async fn activity<S, N>(
  State(pipeline): State<Arc<Pipeline<S, N>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: PipelineStore,
  N: Notifier,
{
  pipeline.subscriber(id).await?;
  let entries = pipeline
    .store()
    .list_activity(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}
