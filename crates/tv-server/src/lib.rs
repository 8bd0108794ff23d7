//! The ThoughtVoice HTTP server.
//!
//! Mounts the JSON API from `tv-api` under `/api` behind staff Basic auth,
//! adds request tracing, and runs the background sweep that sends prompts as
//! they come due.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tv_core::{Pipeline, PipelineConfig, notify::Notifier, store::PipelineStore};

use auth::{AuthConfig, require_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `TV_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  #[serde(default = "default_capture_url")]
  pub capture_url:            String,
  #[serde(default = "default_review_url")]
  pub review_url:             String,
  /// Seconds between sweeps for due prompts. `0` disables the sweep.
  #[serde(default = "default_dispatch_interval")]
  pub dispatch_interval_secs: u64,
  pub auth_username:          String,
  pub auth_password_hash:     String,
}

fn default_capture_url() -> String { PipelineConfig::default().capture_url }

fn default_review_url() -> String { PipelineConfig::default().review_url }

fn default_dispatch_interval() -> u64 { 300 }

impl ServerConfig {
  pub fn pipeline_config(&self) -> PipelineConfig {
    PipelineConfig {
      capture_url: self.capture_url.clone(),
      review_url: self.review_url.clone(),
      ..PipelineConfig::default()
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// Everything under `/api` requires staff credentials; `/health` does not.
pub fn app<S, N>(pipeline: Arc<Pipeline<S, N>>, auth: Arc<AuthConfig>) -> Router
where
  S: PipelineStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .nest("/api", tv_api::api_router(pipeline))
    .layer(middleware::from_fn_with_state(auth, require_auth))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Due-prompt sweep ────────────────────────────────────────────────────────

/// Spawn a task that calls [`Pipeline::dispatch_due`] every `every`.
pub fn spawn_dispatcher<S, N>(pipeline: Arc<Pipeline<S, N>>, every: Duration) -> JoinHandle<()>
where
  S: PipelineStore + 'static,
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    tracing::info!(every = ?every, "due-prompt sweep started");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;
      match pipeline.dispatch_due().await {
        Ok(sent) if !sent.is_empty() => tracing::info!(count = sent.len(), "sent due prompts"),
        Ok(_) => {}
        Err(e) => tracing::warn!("due-prompt sweep failed: {e}"),
      }
    }
  })
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::json;
  use tower::ServiceExt as _;
  use tv_core::{clock::SystemClock, schedule::Scheduler};
  use tv_store_sqlite::SqliteStore;

  async fn make_app(password: &str) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let pipeline = Pipeline::new(
      store.clone(),
      store,
      Arc::new(SystemClock),
      Scheduler::default(),
      PipelineConfig::default(),
    );
    app(
      Arc::new(pipeline),
      Arc::new(AuthConfig { username: "staff".to_string(), password_hash: hash }),
    )
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[tokio::test]
  async fn health_needs_no_credentials() {
    let app = make_app("secret").await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_without_credentials_returns_401() {
    let app = make_app("secret").await;
    let req = Request::builder().uri("/api/subscribers").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn api_with_credentials_is_served() {
    let app = make_app("secret").await;
    let auth = auth_header("staff", "secret");

    let req = Request::builder()
      .method("POST")
      .uri("/api/subscribers")
      .header(header::AUTHORIZATION, auth.as_str())
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json!({ "name": "Jane" }).to_string()))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
      .uri("/api/subscribers")
      .header(header::AUTHORIZATION, auth.as_str())
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body[0]["name"], "Jane");
  }

  #[test]
  fn config_fills_pipeline_defaults() {
    let cfg: ServerConfig = serde_json::from_value(json!({
      "host": "127.0.0.1",
      "port": 8080,
      "store_path": "~/tv.db",
      "review_url": "https://example.com/review",
      "auth_username": "staff",
      "auth_password_hash": "x"
    }))
    .unwrap();

    let pipeline = cfg.pipeline_config();
    assert_eq!(pipeline.review_url, "https://example.com/review");
    assert_eq!(pipeline.capture_url, PipelineConfig::default().capture_url);
    assert_eq!(cfg.dispatch_interval_secs, 300);
  }
}
