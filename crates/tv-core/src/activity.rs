//! Activity log entries. Append-only; the pipeline never reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
  PromptSent,
  RecordingReceived,
  ReviewCompleted,
  Error,
  Info,
}

impl ActivityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PromptSent => "prompt_sent",
      Self::RecordingReceived => "recording_received",
      Self::ReviewCompleted => "review_completed",
      Self::Error => "error",
      Self::Info => "info",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub activity_id:   Uuid,
  pub subscriber_id: Uuid,
  pub kind:          ActivityKind,
  pub description:   String,
  pub metadata:      Option<serde_json::Value>,
  pub recorded_at:   DateTime<Utc>,
}
