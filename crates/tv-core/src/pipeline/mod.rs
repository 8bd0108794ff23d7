//! The production pipeline: prompt and content-item status machines.
//!
//! Every mutation follows the same shape:
//!
//! 1. look the entity up to learn its subscriber,
//! 2. take that subscriber's lock and re-read the entity,
//! 3. validate the transition and apply it,
//! 4. persist,
//! 5. write the activity entry and dispatch notifications.
//!
//! Step 5 is best-effort. Failures there are logged and swallowed; the
//! persisted state change stands.

mod content;
mod prompts;
mod subscribers;

pub use prompts::ScheduleRequest;

use std::sync::Arc;

use chrono::TimeDelta;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::{
  Error, Result,
  activity::{ActivityEntry, ActivityKind},
  clock::Clock,
  content::ContentItem,
  lock::SubscriberLocks,
  notify::{Channel, Notification, Notifier, Recipient},
  prompt::Prompt,
  schedule::Scheduler,
  store::PipelineStore,
  subscriber::Subscriber,
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
  /// Base link for recording a prompt; `?promptId=<id>` is appended.
  pub capture_url:      String,
  /// Base link for reviewing a content item; `/<id>` is appended.
  pub review_url:       String,
  /// Prompts due within this window of now are sent straight away.
  pub immediate_window: TimeDelta,
  /// Length of the delivery forecast included in the welcome email.
  pub welcome_forecast_days: u32,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      capture_url:           "https://thoughtvoice.app/#/capture".to_owned(),
      review_url:            "https://thoughtvoice.app/review".to_owned(),
      immediate_window:      TimeDelta::days(2),
      welcome_forecast_days: 14,
    }
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<S, N> {
  store:     S,
  notifier:  N,
  clock:     Arc<dyn Clock>,
  scheduler: Scheduler,
  locks:     SubscriberLocks,
  config:    PipelineConfig,
}

impl<S, N> Pipeline<S, N>
where
  S: PipelineStore,
  N: Notifier,
{
  pub fn new(
    store: S,
    notifier: N,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
    config: PipelineConfig,
  ) -> Self {
    Self {
      store,
      notifier,
      clock,
      scheduler,
      locks: SubscriberLocks::new(),
      config,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn scheduler(&self) -> &Scheduler { &self.scheduler }

  pub fn config(&self) -> &PipelineConfig { &self.config }

  // ── Lookups ─────────────────────────────────────────────────────────────

  pub async fn subscriber(&self, id: Uuid) -> Result<Subscriber> {
    self
      .store
      .get_subscriber(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubscriberNotFound(id))
  }

  pub async fn prompt(&self, id: Uuid) -> Result<Prompt> {
    self
      .store
      .get_prompt(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PromptNotFound(id))
  }

  pub async fn content(&self, id: Uuid) -> Result<ContentItem> {
    self
      .store
      .get_content(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ContentNotFound(id))
  }

  /// Lock a subscriber that is known to exist. Callers re-read under the
  /// guard.
  async fn lock_existing(&self, subscriber_id: Uuid) -> Result<OwnedMutexGuard<()>> {
    self.subscriber(subscriber_id).await?;
    Ok(self.locks.acquire(subscriber_id).await)
  }

  // ── Side effects ────────────────────────────────────────────────────────

  /// Append an activity entry. Failures are logged, never returned.
  async fn record(
    &self,
    subscriber_id: Uuid,
    kind: ActivityKind,
    description: String,
    metadata: Option<serde_json::Value>,
  ) {
    let entry = ActivityEntry {
      activity_id: Uuid::new_v4(),
      subscriber_id,
      kind,
      description,
      metadata,
      recorded_at: self.clock.now(),
    };
    if let Err(e) = self.store.append_activity(&entry).await {
      tracing::warn!(%subscriber_id, kind = kind.as_str(), "failed to record activity: {e}");
    }
  }

  /// Dispatch one notification. Failures are logged, never returned.
  async fn dispatch(&self, recipient: Recipient, channel: Channel, message: String) {
    let notification = Notification {
      recipient,
      channel,
      message,
      created_at: self.clock.now(),
    };
    let recipient = notification.recipient.clone();
    match self.notifier.notify(notification).await {
      Ok(()) => tracing::debug!(?recipient, channel = channel.as_str(), "notification dispatched"),
      Err(e) => tracing::warn!(
        ?recipient,
        channel = channel.as_str(),
        "notification delivery failed: {e}"
      ),
    }
  }

  /// Dispatch `message` to a subscriber on each of their preferred channels.
  async fn notify_subscriber(&self, subscriber: &Subscriber, message: &str) {
    for channel in subscriber.contact.preferred_channel.channels() {
      self
        .dispatch(Recipient::Subscriber(subscriber.subscriber_id), *channel, message.to_owned())
        .await;
    }
  }
}
