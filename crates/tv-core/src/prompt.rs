//! Prompts (scheduled recording assignments) and their status machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status machine ──────────────────────────────────────────────────────────

/// `pending_review → scheduled → sent → completed`, with `archived` reachable
/// only from `pending_review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
  PendingReview,
  Scheduled,
  Sent,
  Completed,
  Archived,
}

/// An edge in the prompt status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
  Schedule,
  Send,
  Complete,
  Dismiss,
}

impl PromptAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Schedule => "schedule",
      Self::Send => "send",
      Self::Complete => "complete",
      Self::Dismiss => "dismiss",
    }
  }
}

impl PromptStatus {
  /// The state reached by taking `action` from `self`, if that edge exists.
  pub fn apply(self, action: PromptAction) -> Option<Self> {
    use PromptAction as A;
    match (self, action) {
      (Self::PendingReview, A::Schedule) => Some(Self::Scheduled),
      (Self::PendingReview, A::Dismiss) => Some(Self::Archived),
      (Self::Scheduled, A::Send) => Some(Self::Sent),
      (Self::Scheduled | Self::Sent, A::Complete) => Some(Self::Completed),
      _ => None,
    }
  }

  /// Prompts in these states own their delivery day.
  pub fn is_committed(self) -> bool { matches!(self, Self::Scheduled | Self::Sent) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::PendingReview => "pending_review",
      Self::Scheduled => "scheduled",
      Self::Sent => "sent",
      Self::Completed => "completed",
      Self::Archived => "archived",
    }
  }
}

impl std::fmt::Display for PromptStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Prompt ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
  pub prompt_id:       Uuid,
  pub subscriber_id:   Uuid,
  pub status:          PromptStatus,
  /// Target delivery instant; empty until scheduled.
  pub scheduled_for:   Option<DateTime<Utc>>,
  pub question:        String,
  pub context:         String,
  pub context_points:  Vec<String>,
  pub keywords:        Vec<String>,
  /// Where the subscriber's recording lands; set when scheduled.
  pub response_folder: Option<String>,
  pub created_at:      DateTime<Utc>,
}

impl Prompt {
  /// The calendar day this prompt is delivered on.
  pub fn delivery_date(&self) -> Option<NaiveDate> {
    self.scheduled_for.map(|at| at.date_naive())
  }
}

/// Input to [`Pipeline::create_prompt`](crate::Pipeline::create_prompt).
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrompt {
  pub subscriber_id:  Uuid,
  pub question:       String,
  #[serde(default)]
  pub context:        String,
  #[serde(default)]
  pub context_points: Vec<String>,
  #[serde(default)]
  pub keywords:       Vec<String>,
}

impl NewPrompt {
  pub fn new(subscriber_id: Uuid, question: impl Into<String>) -> Self {
    Self {
      subscriber_id,
      question: question.into(),
      context: String::new(),
      context_points: Vec::new(),
      keywords: Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{PromptAction as A, PromptStatus as S};

  const ALL: [S; 5] = [S::PendingReview, S::Scheduled, S::Sent, S::Completed, S::Archived];
  const ACTIONS: [A; 4] = [A::Schedule, A::Send, A::Complete, A::Dismiss];

  fn rank(s: S) -> u8 {
    match s {
      S::PendingReview => 0,
      S::Scheduled => 1,
      S::Sent => 2,
      S::Completed | S::Archived => 3,
    }
  }

  #[test]
  fn every_edge_moves_forward() {
    for from in ALL {
      for action in ACTIONS {
        if let Some(to) = from.apply(action) {
          assert!(rank(to) > rank(from), "{from} -> {to}");
        }
      }
    }
  }

  #[test]
  fn archive_only_from_pending_review() {
    for from in ALL {
      let archived = from.apply(A::Dismiss) == Some(S::Archived);
      assert_eq!(archived, from == S::PendingReview);
    }
  }

  #[test]
  fn terminal_states_have_no_exits() {
    for action in ACTIONS {
      assert_eq!(S::Completed.apply(action), None);
      assert_eq!(S::Archived.apply(action), None);
    }
  }
}
