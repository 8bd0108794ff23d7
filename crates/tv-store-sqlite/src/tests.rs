//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::json;
use tv_core::{
  Pipeline, PipelineConfig,
  activity::{ActivityEntry, ActivityKind},
  clock::FixedClock,
  content::{ContentStatus, NewContentItem},
  notify::{Channel, Notification, Notifier, Recipient},
  pipeline::ScheduleRequest,
  prompt::{NewPrompt, PromptStatus},
  schedule::{ScheduleFrequency, Scheduler},
  store::{ContentQuery, PipelineStore, PromptQuery},
  subscriber::{NewSubscriber, PreferredChannel, SocialPlatform, Subscriber},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

fn pipeline(store: &SqliteStore, now: DateTime<Utc>) -> Pipeline<SqliteStore, SqliteStore> {
  Pipeline::new(
    store.clone(),
    store.clone(),
    Arc::new(FixedClock::new(now)),
    Scheduler::default(),
    PipelineConfig::default(),
  )
}

fn subscriber() -> Subscriber {
  let id = Uuid::new_v4();
  Subscriber {
    subscriber_id:   id,
    name:            "Jane Doe".into(),
    schedule:        ScheduleFrequency::TwicePerWeek,
    timezone:        "America/Chicago".into(),
    customer_status: Default::default(),
    contact:         Default::default(),
    platforms:       vec![SocialPlatform::TikTok, SocialPlatform::LinkedIn],
    root_folder:     Some(format!("/Jane_Doe_{id}")),
    is_onboarded:    false,
    created_at:      at(2024, 3, 1),
    joined_at:       None,
  }
}

// ─── Subscribers ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_and_get_subscriber() {
  let s = store().await;
  let mut sub = subscriber();
  sub.contact.email = "jane@example.com".into();
  sub.contact.preferred_channel = PreferredChannel::Both;
  s.save_subscriber(&sub).await.unwrap();

  let fetched = s.get_subscriber(sub.subscriber_id).await.unwrap();
  assert_eq!(fetched, Some(sub));
}

#[tokio::test]
async fn get_subscriber_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subscriber(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_never_replaces_root_folder() {
  let s = store().await;
  let mut sub = subscriber();
  let root = sub.root_folder.clone();
  s.save_subscriber(&sub).await.unwrap();

  sub.root_folder = Some("/somewhere_else".into());
  sub.is_onboarded = true;
  s.save_subscriber(&sub).await.unwrap();

  let fetched = s.get_subscriber(sub.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched.root_folder, root);
  assert!(fetched.is_onboarded);
  assert_eq!(s.list_subscribers().await.unwrap().len(), 1);
}

// ─── Prompts and content ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_prompts_filters_and_orders_oldest_first() {
  let s = store().await;
  let p = pipeline(&s, at(2024, 3, 3));
  let a = p.create_subscriber(NewSubscriber::new("A", "a@example.com")).await.unwrap();
  let b = p.create_subscriber(NewSubscriber::new("B", "b@example.com")).await.unwrap();

  let first = p.create_prompt(NewPrompt::new(a.subscriber_id, "one")).await.unwrap();
  let second = p.create_prompt(NewPrompt::new(a.subscriber_id, "two")).await.unwrap();
  p.create_prompt(NewPrompt::new(b.subscriber_id, "other")).await.unwrap();
  p.schedule(second.prompt_id, ScheduleRequest::on(at(2024, 3, 20))).await.unwrap();

  let mine = s
    .list_prompts(&PromptQuery::for_subscriber(a.subscriber_id))
    .await
    .unwrap();
  let ids: Vec<_> = mine.iter().map(|p| p.prompt_id).collect();
  assert_eq!(ids, vec![first.prompt_id, second.prompt_id]);

  let scheduled = s
    .list_prompts(&PromptQuery::with_status(PromptStatus::Scheduled))
    .await
    .unwrap();
  assert_eq!(scheduled.len(), 1);
  assert_eq!(scheduled[0].scheduled_for, Some(at(2024, 3, 20)));
  assert!(scheduled[0].response_folder.as_deref().unwrap().ends_with("/03-20-2024"));
}

#[tokio::test]
async fn content_roundtrips_nested_fields() {
  let s = store().await;
  let p = pipeline(&s, at(2024, 3, 4));
  let mut input = NewSubscriber::new("Ana", "ana@example.com");
  input.platforms = vec![SocialPlatform::Instagram, SocialPlatform::Facebook];
  let sub = p.create_subscriber(input).await.unwrap();

  let mut capture = NewContentItem::new(sub.subscriber_id, "Clip");
  capture.assets = Some(json!({ "captions": ["a", "b"] }));
  let item = p.submit_capture(capture).await.unwrap();
  p.assign_editor(item.content_id, "tm-1".into()).await.unwrap();
  p.send_to_review(item.content_id).await.unwrap();
  p.client_reject(item.content_id, "Shorter please".into()).await.unwrap();

  let fetched = s.get_content(item.content_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ContentStatus::RejectedByClient);
  assert_eq!(fetched.assets, Some(json!({ "captions": ["a", "b"] })));
  assert_eq!(fetched.required_deliverables, vec!["9:16 (Vertical)", "4:5 (Portrait)"]);
  assert_eq!(fetched.history.len(), 1);
  assert_eq!(fetched.history[0].text, "Shorter please");
  assert_eq!(fetched, p.content(item.content_id).await.unwrap());
}

#[tokio::test]
async fn list_content_newest_first() {
  let s = store().await;
  let clock = Arc::new(FixedClock::new(at(2024, 3, 4)));
  let p = Pipeline::new(
    s.clone(),
    s.clone(),
    clock.clone(),
    Scheduler::default(),
    PipelineConfig::default(),
  );
  let sub = p.create_subscriber(NewSubscriber::new("A", "a@example.com")).await.unwrap();

  let older = p.submit_capture(NewContentItem::new(sub.subscriber_id, "old")).await.unwrap();
  clock.advance(TimeDelta::hours(1));
  let newer = p.submit_capture(NewContentItem::new(sub.subscriber_id, "new")).await.unwrap();
  p.assign_editor(newer.content_id, "tm-1".into()).await.unwrap();

  let all = s.list_content(&ContentQuery::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|c| c.content_id).collect();
  assert_eq!(ids, vec![newer.content_id, older.content_id]);

  let editing = s
    .list_content(&ContentQuery {
      subscriber_id: Some(sub.subscriber_id),
      status:        Some(ContentStatus::EditingInProgress),
    })
    .await
    .unwrap();
  assert_eq!(editing.len(), 1);
  assert_eq!(editing[0].assigned_to.as_deref(), Some("tm-1"));
}

// ─── Activity and outbox ─────────────────────────────────────────────────────

#[tokio::test]
async fn activity_is_listed_newest_first() {
  let s = store().await;
  let sub = subscriber();
  s.save_subscriber(&sub).await.unwrap();

  for (i, kind) in [ActivityKind::Info, ActivityKind::PromptSent].into_iter().enumerate() {
    s.append_activity(&ActivityEntry {
      activity_id:   Uuid::new_v4(),
      subscriber_id: sub.subscriber_id,
      kind,
      description:   format!("entry {i}"),
      metadata:      Some(json!({ "i": i })),
      recorded_at:   at(2024, 3, 4),
    })
    .await
    .unwrap();
  }

  let entries = s.list_activity(sub.subscriber_id).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0].kind, ActivityKind::PromptSent);
  assert_eq!(entries[1].metadata, Some(json!({ "i": 0 })));
}

#[tokio::test]
async fn notifications_land_in_outbox() {
  let s = store().await;
  let staff = Recipient::Staff("tm-7".into());
  s.notify(Notification {
    recipient:  staff.clone(),
    channel:    Channel::Sms,
    message:    "hello".into(),
    created_at: at(2024, 3, 4),
  })
  .await
  .unwrap();

  let out = s.notifications(&staff).await.unwrap();
  assert_eq!(out.len(), 1);
  assert_eq!(out[0].channel, Channel::Sms);
  assert!(s.notifications(&Recipient::Staff("tm-8".into())).await.unwrap().is_empty());
}

// ─── Pipeline over SQLite ────────────────────────────────────────────────────

#[tokio::test]
async fn scheduling_survives_reopen_of_the_pipeline() {
  let s = store().await;
  let sub = {
    let p = pipeline(&s, at(2024, 3, 3));
    let sub = p.create_subscriber(NewSubscriber::new("A", "a@example.com")).await.unwrap();
    let id = p.create_prompt(NewPrompt::new(sub.subscriber_id, "q1")).await.unwrap().prompt_id;
    p.schedule(id, ScheduleRequest::next_slot()).await.unwrap();
    sub
  };

  // A fresh pipeline sees the committed day and moves on.
  let p = pipeline(&s, at(2024, 3, 3));
  let id = p.create_prompt(NewPrompt::new(sub.subscriber_id, "q2")).await.unwrap().prompt_id;
  let prompt = p.schedule(id, ScheduleRequest::next_slot()).await.unwrap();
  assert_eq!(prompt.scheduled_for, Some(at(2024, 3, 5)));

  let sent = s
    .notifications(&Recipient::Subscriber(sub.subscriber_id))
    .await
    .unwrap();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].message.starts_with("New Prompt: q1"));
}
