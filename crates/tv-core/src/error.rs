//! Error types for `tv-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subscriber not found: {0}")]
  SubscriberNotFound(Uuid),

  #[error("prompt not found: {0}")]
  PromptNotFound(Uuid),

  #[error("content item not found: {0}")]
  ContentNotFound(Uuid),

  /// The requested action is not reachable from the entity's current state.
  #[error("cannot {action} {entity} in state {from}")]
  InvalidTransition {
    entity: &'static str,
    from:   String,
    action: &'static str,
  },

  /// Another scheduled or sent prompt already occupies that calendar day.
  #[error("subscriber {subscriber_id} already has a delivery on {date}")]
  DateAlreadyBooked {
    subscriber_id: Uuid,
    date:          NaiveDate,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::SubscriberNotFound(_) | Self::PromptNotFound(_) | Self::ContentNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
