//! [`MemoryStore`], a process-local implementation of [`PipelineStore`] and
//! [`Notifier`].
//!
//! Dispatched notifications are kept in an outbox that can be inspected,
//! which makes this the backend of choice for pipeline tests.

use std::{
  cmp::Reverse,
  collections::HashMap,
  convert::Infallible,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::{
  activity::ActivityEntry,
  content::ContentItem,
  notify::{Notification, Notifier, Recipient},
  prompt::Prompt,
  store::{ContentQuery, PipelineStore, PromptQuery},
  subscriber::Subscriber,
};

#[derive(Debug, Default)]
struct State {
  subscribers:   HashMap<Uuid, Subscriber>,
  prompts:       HashMap<Uuid, Prompt>,
  content:       HashMap<Uuid, ContentItem>,
  activity:      Vec<ActivityEntry>,
  notifications: Vec<Notification>,
  /// First-insertion sequence per record id. Breaks timestamp ties.
  inserted:      HashMap<Uuid, u64>,
}

impl State {
  fn note_insert(&mut self, id: Uuid) {
    let next = self.inserted.len() as u64;
    self.inserted.entry(id).or_insert(next);
  }

  fn seq(&self, id: &Uuid) -> u64 { self.inserted.get(id).copied().unwrap_or(u64::MAX) }
}

/// Cloning is cheap; clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Every notification dispatched so far, in order.
  pub fn notifications(&self) -> Vec<Notification> { self.state().notifications.clone() }

  pub fn notifications_for(&self, recipient: &Recipient) -> Vec<Notification> {
    self
      .state()
      .notifications
      .iter()
      .filter(|n| &n.recipient == recipient)
      .cloned()
      .collect()
  }
}

impl PipelineStore for MemoryStore {
  type Error = Infallible;

  async fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>, Infallible> {
    Ok(self.state().subscribers.get(&id).cloned())
  }

  async fn list_subscribers(&self) -> Result<Vec<Subscriber>, Infallible> {
    let state = self.state();
    let mut all: Vec<_> = state.subscribers.values().cloned().collect();
    all.sort_by_key(|s| (s.created_at, state.seq(&s.subscriber_id)));
    Ok(all)
  }

  async fn save_subscriber(&self, subscriber: &Subscriber) -> Result<(), Infallible> {
    let mut state = self.state();
    state.note_insert(subscriber.subscriber_id);
    state.subscribers.insert(subscriber.subscriber_id, subscriber.clone());
    Ok(())
  }

  async fn get_prompt(&self, id: Uuid) -> Result<Option<Prompt>, Infallible> {
    Ok(self.state().prompts.get(&id).cloned())
  }

  async fn list_prompts(&self, query: &PromptQuery) -> Result<Vec<Prompt>, Infallible> {
    let state = self.state();
    let mut found: Vec<_> = state
      .prompts
      .values()
      .filter(|p| query.matches(p))
      .cloned()
      .collect();
    found.sort_by_key(|p| (p.created_at, state.seq(&p.prompt_id)));
    Ok(found)
  }

  async fn save_prompt(&self, prompt: &Prompt) -> Result<(), Infallible> {
    let mut state = self.state();
    state.note_insert(prompt.prompt_id);
    state.prompts.insert(prompt.prompt_id, prompt.clone());
    Ok(())
  }

  async fn get_content(&self, id: Uuid) -> Result<Option<ContentItem>, Infallible> {
    Ok(self.state().content.get(&id).cloned())
  }

  async fn list_content(&self, query: &ContentQuery) -> Result<Vec<ContentItem>, Infallible> {
    let state = self.state();
    let mut found: Vec<_> = state
      .content
      .values()
      .filter(|c| query.matches(c))
      .cloned()
      .collect();
    // Newest first; equal timestamps in reverse insertion order.
    found.sort_by_key(|c| Reverse((c.created_at, state.seq(&c.content_id))));
    Ok(found)
  }

  async fn save_content(&self, item: &ContentItem) -> Result<(), Infallible> {
    let mut state = self.state();
    state.note_insert(item.content_id);
    state.content.insert(item.content_id, item.clone());
    Ok(())
  }

  async fn append_activity(&self, entry: &ActivityEntry) -> Result<(), Infallible> {
    self.state().activity.push(entry.clone());
    Ok(())
  }

  async fn list_activity(&self, subscriber_id: Uuid) -> Result<Vec<ActivityEntry>, Infallible> {
    let mut found: Vec<_> = self
      .state()
      .activity
      .iter()
      .filter(|a| a.subscriber_id == subscriber_id)
      .cloned()
      .collect();
    found.reverse();
    Ok(found)
  }
}

impl Notifier for MemoryStore {
  type Error = Infallible;

  async fn notify(&self, notification: Notification) -> Result<(), Infallible> {
    self.state().notifications.push(notification);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::prompt::PromptStatus;

  fn prompt(subscriber_id: Uuid, question: &str) -> Prompt {
    Prompt {
      prompt_id:       Uuid::new_v4(),
      subscriber_id,
      status:          PromptStatus::PendingReview,
      scheduled_for:   None,
      question:        question.into(),
      context:         String::new(),
      context_points:  Vec::new(),
      keywords:        Vec::new(),
      response_folder: None,
      created_at:      Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
    }
  }

  #[tokio::test]
  async fn equal_timestamps_keep_insertion_order() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let prompts: Vec<_> = (0..16).map(|i| prompt(owner, &format!("q{i}"))).collect();
    for p in &prompts {
      store.save_prompt(p).await.unwrap();
    }
    // Re-saving does not move a record.
    store.save_prompt(&prompts[0]).await.unwrap();

    let listed = store
      .list_prompts(&PromptQuery::for_subscriber(owner))
      .await
      .unwrap();
    let questions: Vec<_> = listed.iter().map(|p| p.question.as_str()).collect();
    let expected: Vec<_> = prompts.iter().map(|p| p.question.as_str()).collect();
    assert_eq!(questions, expected);
  }
}
