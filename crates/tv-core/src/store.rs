//! The `PipelineStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`tv-store-sqlite`, and the
//! in-memory [`MemoryStore`](crate::memory::MemoryStore)). The pipeline depends
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  activity::ActivityEntry,
  content::{ContentItem, ContentStatus},
  prompt::{Prompt, PromptStatus},
  subscriber::Subscriber,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`PipelineStore::list_prompts`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptQuery {
  pub subscriber_id: Option<Uuid>,
  pub status:        Option<PromptStatus>,
}

impl PromptQuery {
  pub fn for_subscriber(subscriber_id: Uuid) -> Self {
    Self { subscriber_id: Some(subscriber_id), status: None }
  }

  pub fn with_status(status: PromptStatus) -> Self {
    Self { subscriber_id: None, status: Some(status) }
  }

  pub fn matches(&self, prompt: &Prompt) -> bool {
    self.subscriber_id.is_none_or(|id| id == prompt.subscriber_id)
      && self.status.is_none_or(|s| s == prompt.status)
  }
}

/// Parameters for [`PipelineStore::list_content`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQuery {
  pub subscriber_id: Option<Uuid>,
  pub status:        Option<ContentStatus>,
}

impl ContentQuery {
  pub fn matches(&self, item: &ContentItem) -> bool {
    self.subscriber_id.is_none_or(|id| id == item.subscriber_id)
      && self.status.is_none_or(|s| s == item.status)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persistence and activity-log collaborators.
///
/// Saves are upserts keyed by id. Reads never mutate. All methods return
/// `Send` futures so the trait can be used from multi-threaded runtimes.
pub trait PipelineStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subscribers ───────────────────────────────────────────────────────

  fn get_subscriber(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscriber>, Self::Error>> + Send + '_;

  fn list_subscribers(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscriber>, Self::Error>> + Send + '_;

  fn save_subscriber<'a>(
    &'a self,
    subscriber: &'a Subscriber,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Prompts ───────────────────────────────────────────────────────────

  fn get_prompt(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Prompt>, Self::Error>> + Send + '_;

  /// Prompts matching `query`, oldest first.
  fn list_prompts<'a>(
    &'a self,
    query: &'a PromptQuery,
  ) -> impl Future<Output = Result<Vec<Prompt>, Self::Error>> + Send + 'a;

  fn save_prompt<'a>(
    &'a self,
    prompt: &'a Prompt,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Content items ─────────────────────────────────────────────────────

  fn get_content(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ContentItem>, Self::Error>> + Send + '_;

  /// Content items matching `query`, newest first.
  fn list_content<'a>(
    &'a self,
    query: &'a ContentQuery,
  ) -> impl Future<Output = Result<Vec<ContentItem>, Self::Error>> + Send + 'a;

  fn save_content<'a>(
    &'a self,
    item: &'a ContentItem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Activity log ──────────────────────────────────────────────────────

  fn append_activity<'a>(
    &'a self,
    entry: &'a ActivityEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Activity for one subscriber, newest first.
  fn list_activity(
    &self,
    subscriber_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;
}
