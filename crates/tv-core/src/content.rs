//! Content items (the produced artifact for a capture) and their status
//! machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subscriber::SocialPlatform;

// ─── Status machine ──────────────────────────────────────────────────────────

/// `submitted_to_editors → editing_in_progress → ready_for_review → approved →
/// published`, plus two rejection states that wait for an editor to be
/// (re-)assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
  SubmittedToEditors,
  EditingInProgress,
  ReadyForReview,
  Approved,
  Published,
  /// Sent back by staff QA.
  Rejected,
  /// Sent back by the subscriber during review.
  RejectedByClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAction {
  AssignEditor,
  SendToReview,
  Approve,
  Publish,
  Reject,
  ClientReject,
}

impl ContentAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::AssignEditor => "assign an editor to",
      Self::SendToReview => "send to review",
      Self::Approve => "approve",
      Self::Publish => "publish",
      Self::Reject => "reject",
      Self::ClientReject => "client-reject",
    }
  }
}

impl ContentStatus {
  pub fn apply(self, action: ContentAction) -> Option<Self> {
    use ContentAction as A;
    match (self, action) {
      (
        Self::SubmittedToEditors
        | Self::EditingInProgress
        | Self::Rejected
        | Self::RejectedByClient,
        A::AssignEditor,
      ) => Some(Self::EditingInProgress),
      (Self::EditingInProgress, A::SendToReview) => Some(Self::ReadyForReview),
      (Self::ReadyForReview, A::Approve) => Some(Self::Approved),
      (Self::Approved, A::Publish) => Some(Self::Published),
      (Self::EditingInProgress | Self::ReadyForReview, A::Reject) => Some(Self::Rejected),
      (Self::ReadyForReview, A::ClientReject) => Some(Self::RejectedByClient),
      _ => None,
    }
  }

  /// Position along the forward path. Rejection states rank with editing,
  /// since that is where rework re-enters.
  pub fn stage(self) -> u8 {
    match self {
      Self::SubmittedToEditors => 0,
      Self::EditingInProgress | Self::Rejected | Self::RejectedByClient => 1,
      Self::ReadyForReview => 2,
      Self::Approved => 3,
      Self::Published => 4,
    }
  }

  pub fn is_rejection(self) -> bool { matches!(self, Self::Rejected | Self::RejectedByClient) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::SubmittedToEditors => "submitted_to_editors",
      Self::EditingInProgress => "editing_in_progress",
      Self::ReadyForReview => "ready_for_review",
      Self::Approved => "approved",
      Self::Published => "published",
      Self::Rejected => "rejected",
      Self::RejectedByClient => "rejected_by_client",
    }
  }
}

impl std::fmt::Display for ContentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Whether the assigned editor has taken the job. Only meaningful while the
/// item is `editing_in_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorStatus {
  Pending,
  Accepted,
  Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
  Audio,
  #[default]
  Video,
  Text,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A free-text note left on an item, stamped with the stage it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessNote {
  pub note_id:     Uuid,
  pub text:        String,
  pub author:      String,
  pub recorded_at: DateTime<Utc>,
  pub stage:       ContentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
  pub approved_by: String,
  pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
  pub content_id:            Uuid,
  pub subscriber_id:         Uuid,
  pub title:                 String,
  pub content_type:          ContentType,
  pub status:                ContentStatus,
  pub created_at:            DateTime<Utc>,
  pub prompt_id:             Option<Uuid>,
  pub transcript:            Option<String>,
  /// Generated derivative assets. Opaque to the pipeline.
  pub assets:                Option<serde_json::Value>,
  pub media_url:             Option<String>,
  /// Staff member id; set once an editor is assigned.
  pub assigned_to:           Option<String>,
  pub editor_status:         Option<EditorStatus>,
  pub storage_path:          Option<String>,
  pub review_folder:         Option<String>,
  pub required_deliverables: Vec<String>,
  pub history:               Vec<ProcessNote>,
  pub approval:              Option<ApprovalRecord>,
}

/// Input to [`Pipeline::submit_capture`](crate::Pipeline::submit_capture).
#[derive(Debug, Clone, Deserialize)]
pub struct NewContentItem {
  pub subscriber_id: Uuid,
  pub title:         String,
  #[serde(default)]
  pub content_type:  ContentType,
  pub prompt_id:     Option<Uuid>,
  pub transcript:    Option<String>,
  pub assets:        Option<serde_json::Value>,
  pub media_url:     Option<String>,
}

impl NewContentItem {
  pub fn new(subscriber_id: Uuid, title: impl Into<String>) -> Self {
    Self {
      subscriber_id,
      title: title.into(),
      content_type: ContentType::default(),
      prompt_id: None,
      transcript: None,
      assets: None,
      media_url: None,
    }
  }
}

/// Video aspect ratios the editor must deliver for a set of platforms.
pub fn required_deliverables(platforms: &[SocialPlatform]) -> Vec<String> {
  use SocialPlatform as P;
  let mut out = Vec::new();
  if platforms.iter().any(|p| matches!(p, P::TikTok | P::Instagram)) {
    out.push("9:16 (Vertical)".to_owned());
  }
  if platforms.iter().any(|p| matches!(p, P::LinkedIn | P::Facebook)) {
    out.push("4:5 (Portrait)".to_owned());
  }
  if out.is_empty() {
    out.push("16:9 (Landscape)".to_owned());
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  use ContentAction as A;
  use ContentStatus as S;

  const ALL: [S; 7] = [
    S::SubmittedToEditors,
    S::EditingInProgress,
    S::ReadyForReview,
    S::Approved,
    S::Published,
    S::Rejected,
    S::RejectedByClient,
  ];
  const ACTIONS: [A; 6] =
    [A::AssignEditor, A::SendToReview, A::Approve, A::Publish, A::Reject, A::ClientReject];

  #[test]
  fn only_rejections_move_backward() {
    for from in ALL {
      for action in ACTIONS {
        let Some(to) = from.apply(action) else { continue };
        if matches!(action, A::Reject | A::ClientReject) {
          assert!(to.is_rejection());
        } else {
          assert!(to.stage() >= from.stage(), "{from} -> {to}");
        }
      }
    }
  }

  #[test]
  fn assign_editor_from_review_is_illegal() {
    assert_eq!(S::ReadyForReview.apply(A::AssignEditor), None);
    assert_eq!(S::Approved.apply(A::AssignEditor), None);
  }

  #[test]
  fn rejections_reenter_through_assignment() {
    assert_eq!(S::Rejected.apply(A::AssignEditor), Some(S::EditingInProgress));
    assert_eq!(S::RejectedByClient.apply(A::AssignEditor), Some(S::EditingInProgress));
  }

  #[test]
  fn published_is_terminal() {
    for action in ACTIONS {
      assert_eq!(S::Published.apply(action), None);
    }
  }

  #[test]
  fn deliverables_follow_platforms() {
    use SocialPlatform as P;
    assert_eq!(required_deliverables(&[P::TikTok, P::LinkedIn]), vec!["9:16 (Vertical)", "4:5 (Portrait)"]);
    assert_eq!(required_deliverables(&[P::Twitter]), vec!["16:9 (Landscape)"]);
    assert_eq!(required_deliverables(&[]), vec!["16:9 (Landscape)"]);
  }
}
