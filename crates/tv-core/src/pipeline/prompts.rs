//! Prompt lifecycle: create, schedule, send, complete, dismiss.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::Pipeline;
use crate::{
  Error, Result,
  activity::ActivityKind,
  notify::Notifier,
  paths,
  prompt::{NewPrompt, Prompt, PromptAction, PromptStatus},
  schedule::Slot,
  store::{PipelineStore, PromptQuery},
  subscriber::Subscriber,
};

/// How [`Pipeline::schedule`] picks the delivery instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleRequest {
  /// Deliver on this instant instead of the next open slot.
  pub date:      Option<DateTime<Utc>>,
  /// Deliver right now. Takes precedence over `date`.
  #[serde(default)]
  pub immediate: bool,
}

impl ScheduleRequest {
  pub fn next_slot() -> Self { Self::default() }

  pub fn on(date: DateTime<Utc>) -> Self { Self { date: Some(date), immediate: false } }

  pub fn immediate() -> Self { Self { date: None, immediate: true } }
}

pub(super) fn advance(prompt: &mut Prompt, action: PromptAction) -> Result<()> {
  prompt.status = prompt
    .status
    .apply(action)
    .ok_or_else(|| Error::InvalidTransition {
      entity: "prompt",
      from:   prompt.status.to_string(),
      action: action.as_str(),
    })?;
  Ok(())
}

/// `day` at the wall-clock time of `now`.
fn at_time_of(day: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
  day.and_time(now.time()).and_utc()
}

impl<S, N> Pipeline<S, N>
where
  S: PipelineStore,
  N: Notifier,
{
  /// Create a prompt awaiting review.
  pub async fn create_prompt(&self, input: NewPrompt) -> Result<Prompt> {
    let _guard = self.lock_existing(input.subscriber_id).await?;

    let prompt = Prompt {
      prompt_id:       Uuid::new_v4(),
      subscriber_id:   input.subscriber_id,
      status:          PromptStatus::PendingReview,
      scheduled_for:   None,
      question:        input.question,
      context:         input.context,
      context_points:  input.context_points,
      keywords:        input.keywords,
      response_folder: None,
      created_at:      self.clock.now(),
    };
    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    Ok(prompt)
  }

  /// Give a pending prompt its delivery instant and storage folder.
  ///
  /// The prompt is sent on the spot if `request.immediate` is set or the
  /// resolved instant is inside the immediate window.
  pub async fn schedule(&self, prompt_id: Uuid, request: ScheduleRequest) -> Result<Prompt> {
    let subscriber_id = self.prompt(prompt_id).await?.subscriber_id;
    let _guard = self.locks.acquire(subscriber_id).await;

    let mut prompt = self.prompt(prompt_id).await?;
    advance(&mut prompt, PromptAction::Schedule)?;
    let subscriber = self.subscriber(subscriber_id).await?;

    let siblings: Vec<Prompt> = self
      .store
      .list_prompts(&PromptQuery::for_subscriber(subscriber_id))
      .await
      .map_err(Error::store)?
      .into_iter()
      .filter(|p| p.prompt_id != prompt_id)
      .collect();
    let committed: BTreeSet<NaiveDate> = siblings
      .iter()
      .filter(|p| p.status.is_committed())
      .filter_map(Prompt::delivery_date)
      .collect();

    let now = self.clock.now();
    let target = if request.immediate {
      now
    } else if let Some(date) = request.date {
      date
    } else {
      match self.scheduler.next_slot(subscriber.today(now), &committed, subscriber.schedule) {
        Slot::Open(day) => at_time_of(day, now),
        Slot::Exhausted { .. } => {
          tracing::warn!(%subscriber_id, %prompt_id, "no delivery slot within horizon; falling back to now");
          self
            .record(
              subscriber_id,
              ActivityKind::Error,
              "No delivery slot available within the scheduling horizon".to_owned(),
              Some(json!({ "prompt_id": prompt_id })),
            )
            .await;
          now
        }
      }
    };

    let day = target.date_naive();
    if committed.contains(&day) {
      return Err(Error::DateAlreadyBooked { subscriber_id, date: day });
    }

    let same_day = siblings.iter().filter(|p| p.delivery_date() == Some(day)).count();
    prompt.scheduled_for = Some(target);
    if let Some(root) = &subscriber.root_folder {
      prompt.response_folder = Some(paths::prompt_folder(root, day, same_day));
    }

    let deliver = request.immediate || target - now < self.config.immediate_window;
    if deliver {
      advance(&mut prompt, PromptAction::Send)?;
    }

    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    tracing::info!(%prompt_id, %subscriber_id, %target, status = %prompt.status, "prompt scheduled");

    self
      .record(
        subscriber_id,
        ActivityKind::PromptSent,
        format!("Prompt scheduled: {}", prompt.question),
        Some(json!({ "date": target })),
      )
      .await;

    if deliver {
      self.send_prompt(&subscriber, &prompt).await;
    }
    Ok(prompt)
  }

  /// Send an already-scheduled prompt ahead of its delivery day.
  pub async fn deliver_now(&self, prompt_id: Uuid) -> Result<Prompt> {
    let subscriber_id = self.prompt(prompt_id).await?.subscriber_id;
    let _guard = self.locks.acquire(subscriber_id).await;

    let mut prompt = self.prompt(prompt_id).await?;
    advance(&mut prompt, PromptAction::Send)?;
    let subscriber = self.subscriber(subscriber_id).await?;

    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    tracing::info!(%prompt_id, %subscriber_id, "prompt delivered early");
    self.send_prompt(&subscriber, &prompt).await;
    Ok(prompt)
  }

  /// Send every scheduled prompt whose delivery falls inside the immediate
  /// window. Returns the prompts that were sent.
  pub async fn dispatch_due(&self) -> Result<Vec<Prompt>> {
    let scheduled = self
      .store
      .list_prompts(&PromptQuery::with_status(PromptStatus::Scheduled))
      .await
      .map_err(Error::store)?;

    let mut sent = Vec::new();
    for candidate in scheduled {
      let now = self.clock.now();
      let due = candidate
        .scheduled_for
        .is_some_and(|at| at - now < self.config.immediate_window);
      if !due {
        continue;
      }

      let prompt_id = candidate.prompt_id;
      match self.send_due(candidate).await {
        Ok(Some(prompt)) => sent.push(prompt),
        Ok(None) => {}
        Err(e) => tracing::warn!(%prompt_id, "skipping due prompt: {e}"),
      }
    }

    if !sent.is_empty() {
      tracing::info!(count = sent.len(), "dispatched due prompts");
    }
    Ok(sent)
  }

  /// One step of [`Self::dispatch_due`]. `None` if the prompt moved on since
  /// it was listed.
  async fn send_due(&self, candidate: Prompt) -> Result<Option<Prompt>> {
    let _guard = self.locks.acquire(candidate.subscriber_id).await;
    let mut prompt = self.prompt(candidate.prompt_id).await?;
    if prompt.status != PromptStatus::Scheduled {
      return Ok(None);
    }
    advance(&mut prompt, PromptAction::Send)?;
    let subscriber = self.subscriber(prompt.subscriber_id).await?;

    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    self.send_prompt(&subscriber, &prompt).await;
    Ok(Some(prompt))
  }

  /// Archive a prompt that will not be used.
  pub async fn dismiss(&self, prompt_id: Uuid) -> Result<Prompt> {
    let subscriber_id = self.prompt(prompt_id).await?.subscriber_id;
    let _guard = self.locks.acquire(subscriber_id).await;

    let mut prompt = self.prompt(prompt_id).await?;
    advance(&mut prompt, PromptAction::Dismiss)?;
    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    Ok(prompt)
  }

  /// Mark a scheduled or sent prompt as answered. Irreversible.
  pub async fn complete(&self, prompt_id: Uuid) -> Result<Prompt> {
    let subscriber_id = self.prompt(prompt_id).await?.subscriber_id;
    let _guard = self.locks.acquire(subscriber_id).await;
    self.complete_locked(prompt_id).await
  }

  /// [`Self::complete`] for callers already holding the subscriber lock.
  pub(super) async fn complete_locked(&self, prompt_id: Uuid) -> Result<Prompt> {
    let mut prompt = self.prompt(prompt_id).await?;
    advance(&mut prompt, PromptAction::Complete)?;
    self.store.save_prompt(&prompt).await.map_err(Error::store)?;
    tracing::info!(%prompt_id, "prompt completed");
    Ok(prompt)
  }

  /// Upcoming eligible delivery days for a subscriber's cadence.
  pub async fn forecast(&self, subscriber_id: Uuid, days: u32) -> Result<Vec<NaiveDate>> {
    let subscriber = self.subscriber(subscriber_id).await?;
    let today = subscriber.today(self.clock.now());
    Ok(self.scheduler.forecast(today, subscriber.schedule, days))
  }

  async fn send_prompt(&self, subscriber: &Subscriber, prompt: &Prompt) {
    let link = format!("{}?promptId={}", self.config.capture_url, prompt.prompt_id);
    let message = format!("New Prompt: {}. Record here: {link}", prompt.question);
    self.notify_subscriber(subscriber, &message).await;
  }
}
