//! Notification collaborator.
//!
//! Dispatch is fire-and-forget from the pipeline's point of view: a failed
//! notification is logged and never rolls back the state change that caused
//! it.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Sms,
}

impl Channel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Email => "email",
      Self::Sms => "sms",
    }
  }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
  Subscriber(Uuid),
  /// A staff member, by team-member id.
  Staff(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub recipient:  Recipient,
  pub channel:    Channel,
  pub message:    String,
  pub created_at: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
