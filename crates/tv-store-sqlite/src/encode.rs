//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Unit enums are stored as their snake_case
//! serde names. Nested structures (contact settings, note history, string
//! lists) are compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Serialize, de::DeserializeOwned};
use tv_core::{
  activity::ActivityEntry,
  content::ContentItem,
  notify::{Notification, Recipient},
  prompt::Prompt,
  subscriber::Subscriber,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Unit enums ──────────────────────────────────────────────────────────────

/// The serde name of a unit variant, e.g. `ready_for_review`.
pub fn encode_enum<T: Serialize>(value: &T) -> Result<String> {
  match serde_json::to_value(value)? {
    serde_json::Value::String(s) => Ok(s),
    other => Ok(other.to_string()),
  }
}

pub fn decode_enum<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_value(serde_json::Value::String(s.to_owned()))?)
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> { Ok(serde_json::from_str(s)?) }

// ─── Recipient ───────────────────────────────────────────────────────────────

pub fn encode_recipient(r: &Recipient) -> (&'static str, String) {
  match r {
    Recipient::Subscriber(id) => ("subscriber", encode_uuid(*id)),
    Recipient::Staff(id) => ("staff", id.clone()),
  }
}

pub fn decode_recipient(kind: &str, id: String) -> Result<Recipient> {
  match kind {
    "subscriber" => Ok(Recipient::Subscriber(decode_uuid(&id)?)),
    "staff" => Ok(Recipient::Staff(id)),
    other => Err(Error::UnknownVariant { kind: "recipient kind", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBSCRIBER_COLUMNS: &str = "subscriber_id, name, schedule, timezone, customer_status, \
                                      contact, platforms, root_folder, is_onboarded, created_at, \
                                      joined_at";

/// Raw values read directly from a `subscribers` row.
pub struct RawSubscriber {
  pub subscriber_id:   String,
  pub name:            String,
  pub schedule:        String,
  pub timezone:        String,
  pub customer_status: String,
  pub contact:         String,
  pub platforms:       String,
  pub root_folder:     Option<String>,
  pub is_onboarded:    bool,
  pub created_at:      String,
  pub joined_at:       Option<String>,
}

impl RawSubscriber {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscriber_id:   row.get(0)?,
      name:            row.get(1)?,
      schedule:        row.get(2)?,
      timezone:        row.get(3)?,
      customer_status: row.get(4)?,
      contact:         row.get(5)?,
      platforms:       row.get(6)?,
      root_folder:     row.get(7)?,
      is_onboarded:    row.get(8)?,
      created_at:      row.get(9)?,
      joined_at:       row.get(10)?,
    })
  }

  pub fn encode(s: &Subscriber) -> Result<Self> {
    Ok(Self {
      subscriber_id:   encode_uuid(s.subscriber_id),
      name:            s.name.clone(),
      schedule:        s.schedule.as_str().to_owned(),
      timezone:        s.timezone.clone(),
      customer_status: s.customer_status.as_str().to_owned(),
      contact:         encode_json(&s.contact)?,
      platforms:       encode_json(&s.platforms)?,
      root_folder:     s.root_folder.clone(),
      is_onboarded:    s.is_onboarded,
      created_at:      encode_dt(s.created_at),
      joined_at:       s.joined_at.map(encode_dt),
    })
  }

  pub fn into_subscriber(self) -> Result<Subscriber> {
    Ok(Subscriber {
      subscriber_id:   decode_uuid(&self.subscriber_id)?,
      name:            self.name,
      schedule:        decode_enum(&self.schedule)?,
      timezone:        self.timezone,
      customer_status: decode_enum(&self.customer_status)?,
      contact:         decode_json(&self.contact)?,
      platforms:       decode_json(&self.platforms)?,
      root_folder:     self.root_folder,
      is_onboarded:    self.is_onboarded,
      created_at:      decode_dt(&self.created_at)?,
      joined_at:       self.joined_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const PROMPT_COLUMNS: &str = "prompt_id, subscriber_id, status, scheduled_for, question, \
                                  context, context_points, keywords, response_folder, created_at";

/// Raw values read directly from a `prompts` row.
pub struct RawPrompt {
  pub prompt_id:       String,
  pub subscriber_id:   String,
  pub status:          String,
  pub scheduled_for:   Option<String>,
  pub question:        String,
  pub context:         String,
  pub context_points:  String,
  pub keywords:        String,
  pub response_folder: Option<String>,
  pub created_at:      String,
}

impl RawPrompt {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      prompt_id:       row.get(0)?,
      subscriber_id:   row.get(1)?,
      status:          row.get(2)?,
      scheduled_for:   row.get(3)?,
      question:        row.get(4)?,
      context:         row.get(5)?,
      context_points:  row.get(6)?,
      keywords:        row.get(7)?,
      response_folder: row.get(8)?,
      created_at:      row.get(9)?,
    })
  }

  pub fn encode(p: &Prompt) -> Result<Self> {
    Ok(Self {
      prompt_id:       encode_uuid(p.prompt_id),
      subscriber_id:   encode_uuid(p.subscriber_id),
      status:          p.status.as_str().to_owned(),
      scheduled_for:   p.scheduled_for.map(encode_dt),
      question:        p.question.clone(),
      context:         p.context.clone(),
      context_points:  encode_json(&p.context_points)?,
      keywords:        encode_json(&p.keywords)?,
      response_folder: p.response_folder.clone(),
      created_at:      encode_dt(p.created_at),
    })
  }

  pub fn into_prompt(self) -> Result<Prompt> {
    Ok(Prompt {
      prompt_id:       decode_uuid(&self.prompt_id)?,
      subscriber_id:   decode_uuid(&self.subscriber_id)?,
      status:          decode_enum(&self.status)?,
      scheduled_for:   self.scheduled_for.as_deref().map(decode_dt).transpose()?,
      question:        self.question,
      context:         self.context,
      context_points:  decode_json(&self.context_points)?,
      keywords:        decode_json(&self.keywords)?,
      response_folder: self.response_folder,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const CONTENT_COLUMNS: &str = "content_id, subscriber_id, title, content_type, status, \
                                   created_at, prompt_id, transcript, assets, media_url, \
                                   assigned_to, editor_status, storage_path, review_folder, \
                                   required_deliverables, history, approval";

/// Raw values read directly from a `content_items` row.
pub struct RawContent {
  pub content_id:            String,
  pub subscriber_id:         String,
  pub title:                 String,
  pub content_type:          String,
  pub status:                String,
  pub created_at:            String,
  pub prompt_id:             Option<String>,
  pub transcript:            Option<String>,
  pub assets:                Option<String>,
  pub media_url:             Option<String>,
  pub assigned_to:           Option<String>,
  pub editor_status:         Option<String>,
  pub storage_path:          Option<String>,
  pub review_folder:         Option<String>,
  pub required_deliverables: String,
  pub history:               String,
  pub approval:              Option<String>,
}

impl RawContent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      content_id:            row.get(0)?,
      subscriber_id:         row.get(1)?,
      title:                 row.get(2)?,
      content_type:          row.get(3)?,
      status:                row.get(4)?,
      created_at:            row.get(5)?,
      prompt_id:             row.get(6)?,
      transcript:            row.get(7)?,
      assets:                row.get(8)?,
      media_url:             row.get(9)?,
      assigned_to:           row.get(10)?,
      editor_status:         row.get(11)?,
      storage_path:          row.get(12)?,
      review_folder:         row.get(13)?,
      required_deliverables: row.get(14)?,
      history:               row.get(15)?,
      approval:              row.get(16)?,
    })
  }

  pub fn encode(c: &ContentItem) -> Result<Self> {
    Ok(Self {
      content_id:            encode_uuid(c.content_id),
      subscriber_id:         encode_uuid(c.subscriber_id),
      title:                 c.title.clone(),
      content_type:          encode_enum(&c.content_type)?,
      status:                c.status.as_str().to_owned(),
      created_at:            encode_dt(c.created_at),
      prompt_id:             c.prompt_id.map(encode_uuid),
      transcript:            c.transcript.clone(),
      assets:                c.assets.as_ref().map(encode_json).transpose()?,
      media_url:             c.media_url.clone(),
      assigned_to:           c.assigned_to.clone(),
      editor_status:         c.editor_status.as_ref().map(encode_enum).transpose()?,
      storage_path:          c.storage_path.clone(),
      review_folder:         c.review_folder.clone(),
      required_deliverables: encode_json(&c.required_deliverables)?,
      history:               encode_json(&c.history)?,
      approval:              c.approval.as_ref().map(encode_json).transpose()?,
    })
  }

  pub fn into_content(self) -> Result<ContentItem> {
    Ok(ContentItem {
      content_id:            decode_uuid(&self.content_id)?,
      subscriber_id:         decode_uuid(&self.subscriber_id)?,
      title:                 self.title,
      content_type:          decode_enum(&self.content_type)?,
      status:                decode_enum(&self.status)?,
      created_at:            decode_dt(&self.created_at)?,
      prompt_id:             self.prompt_id.as_deref().map(decode_uuid).transpose()?,
      transcript:            self.transcript,
      assets:                self.assets.as_deref().map(decode_json).transpose()?,
      media_url:             self.media_url,
      assigned_to:           self.assigned_to,
      editor_status:         self.editor_status.as_deref().map(decode_enum).transpose()?,
      storage_path:          self.storage_path,
      review_folder:         self.review_folder,
      required_deliverables: decode_json(&self.required_deliverables)?,
      history:               decode_json(&self.history)?,
      approval:              self.approval.as_deref().map(decode_json).transpose()?,
    })
  }
}

/// Raw values read directly from an `activity_log` row.
pub struct RawActivity {
  pub activity_id:   String,
  pub subscriber_id: String,
  pub kind:          String,
  pub description:   String,
  pub metadata:      Option<String>,
  pub recorded_at:   String,
}

impl RawActivity {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_id:   row.get(0)?,
      subscriber_id: row.get(1)?,
      kind:          row.get(2)?,
      description:   row.get(3)?,
      metadata:      row.get(4)?,
      recorded_at:   row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<ActivityEntry> {
    Ok(ActivityEntry {
      activity_id:   decode_uuid(&self.activity_id)?,
      subscriber_id: decode_uuid(&self.subscriber_id)?,
      kind:          decode_enum(&self.kind)?,
      description:   self.description,
      metadata:      self.metadata.as_deref().map(decode_json).transpose()?,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub recipient_kind: String,
  pub recipient_id:   String,
  pub channel:        String,
  pub message:        String,
  pub created_at:     String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recipient_kind: row.get(0)?,
      recipient_id:   row.get(1)?,
      channel:        row.get(2)?,
      message:        row.get(3)?,
      created_at:     row.get(4)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      recipient:  decode_recipient(&self.recipient_kind, self.recipient_id)?,
      channel:    decode_enum(&self.channel)?,
      message:    self.message,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use tv_core::{content::ContentStatus, schedule::ScheduleFrequency};

  use super::*;

  #[test]
  fn enums_use_serde_names() {
    assert_eq!(encode_enum(&ContentStatus::RejectedByClient).unwrap(), "rejected_by_client");
    let s: ContentStatus = decode_enum("ready_for_review").unwrap();
    assert_eq!(s, ContentStatus::ReadyForReview);
  }

  #[test]
  fn unknown_cadence_decodes_as_unrestricted() {
    let f: ScheduleFrequency = decode_enum("every_full_moon").unwrap();
    assert_eq!(f, ScheduleFrequency::Unrestricted);
  }

  #[test]
  fn recipient_columns() {
    let id = Uuid::new_v4();
    let (kind, raw) = encode_recipient(&Recipient::Subscriber(id));
    assert_eq!(decode_recipient(kind, raw).unwrap(), Recipient::Subscriber(id));
    assert!(decode_recipient("robot", "x".into()).is_err());
  }
}
