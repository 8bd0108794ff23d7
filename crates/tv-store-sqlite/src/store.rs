//! [`SqliteStore`], the SQLite implementation of [`PipelineStore`] and
//! [`Notifier`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tv_core::{
  activity::ActivityEntry,
  content::ContentItem,
  notify::{Notification, Notifier, Recipient},
  prompt::Prompt,
  store::{ContentQuery, PipelineStore, PromptQuery},
  subscriber::Subscriber,
};

use crate::{
  Result,
  encode::{
    CONTENT_COLUMNS, PROMPT_COLUMNS, RawActivity, RawContent, RawNotification, RawPrompt,
    RawSubscriber, SUBSCRIBER_COLUMNS, encode_dt, encode_enum, encode_json, encode_recipient,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pipeline store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "sqlite store opened");
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Outbox entries addressed to `recipient`, oldest first.
  pub async fn notifications(&self, recipient: &Recipient) -> Result<Vec<Notification>> {
    let (kind, id) = encode_recipient(recipient);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT recipient_kind, recipient_id, channel, message, created_at
           FROM notifications
           WHERE recipient_kind = ?1 AND recipient_id = ?2
           ORDER BY notification_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind, id], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}

// ─── PipelineStore impl ──────────────────────────────────────────────────────

impl PipelineStore for SqliteStore {
  type Error = crate::Error;

  // ── Subscribers ───────────────────────────────────────────────────────────

  async fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscriber> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE subscriber_id = ?1"),
              rusqlite::params![id_str],
              RawSubscriber::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscriber::into_subscriber).transpose()
  }

  async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
    let raws: Vec<RawSubscriber> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawSubscriber::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscriber::into_subscriber).collect()
  }

  async fn save_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
    let raw = RawSubscriber::encode(subscriber)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscribers (
             subscriber_id, name, schedule, timezone, customer_status,
             contact, platforms, root_folder, is_onboarded, created_at, joined_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
           ON CONFLICT (subscriber_id) DO UPDATE SET
             name            = excluded.name,
             schedule        = excluded.schedule,
             timezone        = excluded.timezone,
             customer_status = excluded.customer_status,
             contact         = excluded.contact,
             platforms       = excluded.platforms,
             root_folder     = COALESCE(subscribers.root_folder, excluded.root_folder),
             is_onboarded    = excluded.is_onboarded,
             joined_at       = excluded.joined_at",
          rusqlite::params![
            raw.subscriber_id,
            raw.name,
            raw.schedule,
            raw.timezone,
            raw.customer_status,
            raw.contact,
            raw.platforms,
            raw.root_folder,
            raw.is_onboarded,
            raw.created_at,
            raw.joined_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Prompts ───────────────────────────────────────────────────────────────

  async fn get_prompt(&self, id: Uuid) -> Result<Option<Prompt>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPrompt> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE prompt_id = ?1"),
              rusqlite::params![id_str],
              RawPrompt::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPrompt::into_prompt).transpose()
  }

  async fn list_prompts(&self, query: &PromptQuery) -> Result<Vec<Prompt>> {
    let subscriber_str = query.subscriber_id.map(encode_uuid);
    let status_str = query.status.map(|s| s.as_str().to_owned());

    let raws: Vec<RawPrompt> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROMPT_COLUMNS} FROM prompts
           WHERE (?1 IS NULL OR subscriber_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![subscriber_str, status_str],
            RawPrompt::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPrompt::into_prompt).collect()
  }

  async fn save_prompt(&self, prompt: &Prompt) -> Result<()> {
    let raw = RawPrompt::encode(prompt)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO prompts (
             prompt_id, subscriber_id, status, scheduled_for, question,
             context, context_points, keywords, response_folder, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT (prompt_id) DO UPDATE SET
             status          = excluded.status,
             scheduled_for   = excluded.scheduled_for,
             question        = excluded.question,
             context         = excluded.context,
             context_points  = excluded.context_points,
             keywords        = excluded.keywords,
             response_folder = excluded.response_folder",
          rusqlite::params![
            raw.prompt_id,
            raw.subscriber_id,
            raw.status,
            raw.scheduled_for,
            raw.question,
            raw.context,
            raw.context_points,
            raw.keywords,
            raw.response_folder,
            raw.created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Content items ─────────────────────────────────────────────────────────

  async fn get_content(&self, id: Uuid) -> Result<Option<ContentItem>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawContent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTENT_COLUMNS} FROM content_items WHERE content_id = ?1"),
              rusqlite::params![id_str],
              RawContent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContent::into_content).transpose()
  }

  async fn list_content(&self, query: &ContentQuery) -> Result<Vec<ContentItem>> {
    let subscriber_str = query.subscriber_id.map(encode_uuid);
    let status_str = query.status.map(|s| s.as_str().to_owned());

    let raws: Vec<RawContent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTENT_COLUMNS} FROM content_items
           WHERE (?1 IS NULL OR subscriber_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![subscriber_str, status_str],
            RawContent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContent::into_content).collect()
  }

  async fn save_content(&self, item: &ContentItem) -> Result<()> {
    let raw = RawContent::encode(item)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO content_items (
             content_id, subscriber_id, title, content_type, status, created_at,
             prompt_id, transcript, assets, media_url, assigned_to, editor_status,
             storage_path, review_folder, required_deliverables, history, approval
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
           ON CONFLICT (content_id) DO UPDATE SET
             title                 = excluded.title,
             content_type          = excluded.content_type,
             status                = excluded.status,
             transcript            = excluded.transcript,
             assets                = excluded.assets,
             media_url             = excluded.media_url,
             assigned_to           = excluded.assigned_to,
             editor_status         = excluded.editor_status,
             storage_path          = excluded.storage_path,
             review_folder         = excluded.review_folder,
             required_deliverables = excluded.required_deliverables,
             history               = excluded.history,
             approval              = excluded.approval",
          rusqlite::params![
            raw.content_id,
            raw.subscriber_id,
            raw.title,
            raw.content_type,
            raw.status,
            raw.created_at,
            raw.prompt_id,
            raw.transcript,
            raw.assets,
            raw.media_url,
            raw.assigned_to,
            raw.editor_status,
            raw.storage_path,
            raw.review_folder,
            raw.required_deliverables,
            raw.history,
            raw.approval,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Activity log ──────────────────────────────────────────────────────────

  async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
    let id_str = encode_uuid(entry.activity_id);
    let subscriber_str = encode_uuid(entry.subscriber_id);
    let kind_str = entry.kind.as_str().to_owned();
    let description = entry.description.clone();
    let metadata_str = entry.metadata.as_ref().map(encode_json).transpose()?;
    let at_str = encode_dt(entry.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activity_log (
             activity_id, subscriber_id, kind, description, metadata, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, subscriber_str, kind_str, description, metadata_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_activity(&self, subscriber_id: Uuid) -> Result<Vec<ActivityEntry>> {
    let subscriber_str = encode_uuid(subscriber_id);

    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT activity_id, subscriber_id, kind, description, metadata, recorded_at
           FROM activity_log
           WHERE subscriber_id = ?1
           ORDER BY recorded_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![subscriber_str], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_entry).collect()
  }
}

// ─── Notifier impl ───────────────────────────────────────────────────────────

impl Notifier for SqliteStore {
  type Error = crate::Error;

  async fn notify(&self, notification: Notification) -> Result<()> {
    let (kind, id) = encode_recipient(&notification.recipient);
    let channel = encode_enum(&notification.channel)?;
    let at_str = encode_dt(notification.created_at);
    let message = notification.message;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (recipient_kind, recipient_id, channel, message, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![kind, id, channel, message, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
