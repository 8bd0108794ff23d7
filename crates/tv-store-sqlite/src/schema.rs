//! SQL schema for the ThoughtVoice SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subscribers (
    subscriber_id   TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    schedule        TEXT NOT NULL,   -- cadence, e.g. 'weekdays_only'
    timezone        TEXT NOT NULL,
    customer_status TEXT NOT NULL,
    contact         TEXT NOT NULL,   -- JSON ContactSettings
    platforms       TEXT NOT NULL DEFAULT '[]',
    root_folder     TEXT,
    is_onboarded    INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC
    joined_at       TEXT
);

CREATE TABLE IF NOT EXISTS prompts (
    prompt_id       TEXT PRIMARY KEY,
    subscriber_id   TEXT NOT NULL REFERENCES subscribers(subscriber_id),
    status          TEXT NOT NULL,
    scheduled_for   TEXT,
    question        TEXT NOT NULL,
    context         TEXT NOT NULL DEFAULT '',
    context_points  TEXT NOT NULL DEFAULT '[]',
    keywords        TEXT NOT NULL DEFAULT '[]',
    response_folder TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS content_items (
    content_id            TEXT PRIMARY KEY,
    subscriber_id         TEXT NOT NULL REFERENCES subscribers(subscriber_id),
    title                 TEXT NOT NULL,
    content_type          TEXT NOT NULL,
    status                TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    prompt_id             TEXT REFERENCES prompts(prompt_id),
    transcript            TEXT,
    assets                TEXT,          -- opaque JSON
    media_url             TEXT,
    assigned_to           TEXT,
    editor_status         TEXT,
    storage_path          TEXT,
    review_folder         TEXT,
    required_deliverables TEXT NOT NULL DEFAULT '[]',
    history               TEXT NOT NULL DEFAULT '[]',
    approval              TEXT           -- JSON ApprovalRecord or NULL
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS activity_log (
    activity_id   TEXT PRIMARY KEY,
    subscriber_id TEXT NOT NULL REFERENCES subscribers(subscriber_id),
    kind          TEXT NOT NULL,
    description   TEXT NOT NULL,
    metadata      TEXT,
    recorded_at   TEXT NOT NULL
);

-- Outbox of dispatched notifications, drained by a delivery worker.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_kind  TEXT NOT NULL,   -- 'subscriber' | 'staff'
    recipient_id    TEXT NOT NULL,
    channel         TEXT NOT NULL,   -- 'email' | 'sms'
    message         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS prompts_subscriber_idx  ON prompts(subscriber_id);
CREATE INDEX IF NOT EXISTS prompts_status_idx      ON prompts(status);
CREATE INDEX IF NOT EXISTS content_subscriber_idx  ON content_items(subscriber_id);
CREATE INDEX IF NOT EXISTS activity_subscriber_idx ON activity_log(subscriber_id);
CREATE INDEX IF NOT EXISTS notifications_recipient_idx
    ON notifications(recipient_kind, recipient_id);

PRAGMA user_version = 1;
";
