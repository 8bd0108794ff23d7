//! Content-item lifecycle: capture submission, editing, review, approval.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Pipeline, prompts::advance as advance_prompt};
use crate::{
  Error, Result,
  activity::ActivityKind,
  content::{
    ApprovalRecord, ContentAction, ContentItem, ContentStatus, EditorStatus, NewContentItem,
    ProcessNote, required_deliverables,
  },
  notify::{Channel, Notifier, Recipient},
  paths,
  prompt::PromptAction,
  store::PipelineStore,
  subscriber::PreferredChannel,
};

fn advance(item: &mut ContentItem, action: ContentAction) -> Result<()> {
  item.status = item
    .status
    .apply(action)
    .ok_or_else(|| Error::InvalidTransition {
      entity: "content item",
      from:   item.status.to_string(),
      action: action.as_str(),
    })?;
  Ok(())
}

fn note(item: &ContentItem, text: String, author: String, at: DateTime<Utc>) -> ProcessNote {
  ProcessNote {
    note_id: Uuid::new_v4(),
    text,
    author,
    recorded_at: at,
    stage: item.status,
  }
}

impl<S, N> Pipeline<S, N>
where
  S: PipelineStore,
  N: Notifier,
{
  /// Lock the item's subscriber, re-read the item, apply `f`, and persist.
  async fn update_content<F>(&self, content_id: Uuid, f: F) -> Result<ContentItem>
  where
    F: FnOnce(&mut ContentItem, DateTime<Utc>) -> Result<()> + Send,
  {
    let subscriber_id = self.content(content_id).await?.subscriber_id;
    let _guard = self.locks.acquire(subscriber_id).await;

    let mut item = self.content(content_id).await?;
    f(&mut item, self.clock.now())?;
    self.store.save_content(&item).await.map_err(Error::store)?;
    tracing::info!(%content_id, status = %item.status, "content item updated");
    Ok(item)
  }

  /// Record a capture. Completes the prompt it answers, if any.
  pub async fn submit_capture(&self, input: NewContentItem) -> Result<ContentItem> {
    let subscriber_id = input.subscriber_id;
    let _guard = self.lock_existing(subscriber_id).await?;
    let subscriber = self.subscriber(subscriber_id).await?;
    let now = self.clock.now();

    // Validate the prompt edge before anything is written.
    let prompt = match input.prompt_id {
      Some(prompt_id) => {
        let mut prompt = self.prompt(prompt_id).await?;
        if prompt.subscriber_id != subscriber_id {
          return Err(Error::PromptNotFound(prompt_id));
        }
        advance_prompt(&mut prompt, PromptAction::Complete)?;
        Some(prompt)
      }
      None => None,
    };

    let storage_path = prompt
      .as_ref()
      .and_then(|p| p.response_folder.clone())
      .or_else(|| {
        subscriber
          .root_folder
          .as_deref()
          .map(|root| paths::unassigned_folder(root, now))
      });

    let item = ContentItem {
      content_id: Uuid::new_v4(),
      subscriber_id,
      title: input.title,
      content_type: input.content_type,
      status: ContentStatus::SubmittedToEditors,
      created_at: now,
      prompt_id: input.prompt_id,
      transcript: input.transcript,
      assets: input.assets,
      media_url: input.media_url,
      assigned_to: None,
      editor_status: None,
      storage_path,
      review_folder: None,
      required_deliverables: required_deliverables(&subscriber.platforms),
      history: Vec::new(),
      approval: None,
    };
    self.store.save_content(&item).await.map_err(Error::store)?;

    if let Some(prompt) = &prompt {
      self.complete_locked(prompt.prompt_id).await?;
    }
    tracing::info!(content_id = %item.content_id, %subscriber_id, "capture submitted");

    self
      .record(
        subscriber_id,
        ActivityKind::RecordingReceived,
        format!("Received: {}", item.title),
        None,
      )
      .await;
    self
      .dispatch(
        Recipient::Subscriber(subscriber_id),
        Channel::Email,
        format!("Submission Received: {}. Tracking ID: {}", item.title, item.content_id),
      )
      .await;
    Ok(item)
  }

  /// Hand an item to an editor. Also the re-entry point after a rejection or
  /// a declined assignment.
  pub async fn assign_editor(&self, content_id: Uuid, editor_id: String) -> Result<ContentItem> {
    let subscriber_id = self.content(content_id).await?.subscriber_id;
    let subscriber = self.subscriber(subscriber_id).await?;

    let editor = editor_id.clone();
    let item = self
      .update_content(content_id, move |item, now| {
        advance(item, ContentAction::AssignEditor)?;
        item.assigned_to = Some(editor);
        item.editor_status = Some(EditorStatus::Pending);
        if let Some(root) = &subscriber.root_folder {
          item.review_folder = Some(paths::review_folder(root, now));
        }
        Ok(())
      })
      .await?;

    self
      .dispatch(
        Recipient::Staff(editor_id),
        Channel::Email,
        format!("Task assigned: {} ({})", item.title, item.content_id),
      )
      .await;
    Ok(item)
  }

  /// The assigned editor accepts or declines. No top-level status change.
  pub async fn editor_respond(&self, content_id: Uuid, accepted: bool) -> Result<ContentItem> {
    self
      .update_content(content_id, move |item, _| {
        // One answer per assignment; a decline is only undone by reassigning.
        if item.status != ContentStatus::EditingInProgress
          || item.editor_status != Some(EditorStatus::Pending)
        {
          return Err(Error::InvalidTransition {
            entity: "content item",
            from:   item.status.to_string(),
            action: "record an editor response for",
          });
        }
        item.editor_status = Some(if accepted {
          EditorStatus::Accepted
        } else {
          EditorStatus::Rejected
        });
        Ok(())
      })
      .await
  }

  /// Editing is done; ask the subscriber to review.
  pub async fn send_to_review(&self, content_id: Uuid) -> Result<ContentItem> {
    let item = self
      .update_content(content_id, |item, _| {
        if item.editor_status == Some(EditorStatus::Rejected) {
          return Err(Error::InvalidTransition {
            entity: "content item",
            from:   format!("{} (editor declined)", item.status),
            action: ContentAction::SendToReview.as_str(),
          });
        }
        advance(item, ContentAction::SendToReview)
      })
      .await?;

    let subscriber = self.subscriber(item.subscriber_id).await?;
    let link = format!("{}/{}", self.config.review_url, item.content_id);
    let recipient = Recipient::Subscriber(subscriber.subscriber_id);

    self
      .dispatch(
        recipient.clone(),
        Channel::Email,
        format!("Your content \"{}\" is ready for review: {link}", item.title),
      )
      .await;
    if subscriber.contact.preferred_channel != PreferredChannel::Email {
      self
        .dispatch(
          recipient,
          Channel::Sms,
          format!("ThoughtVoice: Your content \"{}\" is ready for review. {link}", item.title),
        )
        .await;
    }
    Ok(item)
  }

  /// The subscriber signs off. Irreversible.
  pub async fn approve(&self, content_id: Uuid, approver: String) -> Result<ContentItem> {
    let approved_by = approver.clone();
    let item = self
      .update_content(content_id, move |item, now| {
        advance(item, ContentAction::Approve)?;
        item.approval = Some(ApprovalRecord { approved_by, approved_at: now });
        Ok(())
      })
      .await?;

    self
      .record(
        item.subscriber_id,
        ActivityKind::ReviewCompleted,
        format!("Approved by {approver}: {}", item.title),
        None,
      )
      .await;
    Ok(item)
  }

  /// Staff QA sends the item back for rework.
  pub async fn reject(&self, content_id: Uuid, reason: String, author: String) -> Result<ContentItem> {
    self
      .update_content(content_id, move |item, now| {
        advance(item, ContentAction::Reject)?;
        let n = note(item, reason, author, now);
        item.history.push(n);
        Ok(())
      })
      .await
  }

  /// The subscriber rejects the cut during review.
  pub async fn client_reject(&self, content_id: Uuid, reason: String) -> Result<ContentItem> {
    let item = self
      .update_content(content_id, move |item, now| {
        advance(item, ContentAction::ClientReject)?;
        let n = note(item, reason, "client".to_owned(), now);
        item.history.push(n);
        Ok(())
      })
      .await?;

    self
      .record(
        item.subscriber_id,
        ActivityKind::ReviewCompleted,
        format!("Changes requested: {}", item.title),
        None,
      )
      .await;
    Ok(item)
  }

  pub async fn publish(&self, content_id: Uuid) -> Result<ContentItem> {
    self
      .update_content(content_id, |item, _| advance(item, ContentAction::Publish))
      .await
  }

  /// Append a note stamped with the item's current stage.
  pub async fn add_note(&self, content_id: Uuid, text: String, author: String) -> Result<ContentItem> {
    self
      .update_content(content_id, move |item, now| {
        let n = note(item, text, author, now);
        item.history.push(n);
        Ok(())
      })
      .await
  }
}
