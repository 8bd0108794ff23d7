//! Subscriber: one client of the service and their delivery configuration.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{notify::Channel, paths, schedule::ScheduleFrequency};

/// Where a subscriber sits in the customer lifecycle. Churn is a status, not a
/// deletion.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
  #[default]
  Lead,
  Onboarding,
  Active,
  Churned,
  Paused,
}

impl CustomerStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Lead => "lead",
      Self::Onboarding => "onboarding",
      Self::Active => "active",
      Self::Churned => "churned",
      Self::Paused => "paused",
    }
  }
}

/// How the subscriber wants to be reached.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PreferredChannel {
  #[default]
  Email,
  Sms,
  Both,
}

impl PreferredChannel {
  pub fn channels(self) -> &'static [Channel] {
    match self {
      Self::Email => &[Channel::Email],
      Self::Sms => &[Channel::Sms],
      Self::Both => &[Channel::Email, Channel::Sms],
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSettings {
  pub email:             String,
  pub phone:             Option<String>,
  #[serde(default)]
  pub preferred_channel: PreferredChannel,
}

/// A social network the subscriber publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
  LinkedIn,
  Twitter,
  Instagram,
  TikTok,
  YouTube,
  Facebook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
  pub subscriber_id:   Uuid,
  pub name:            String,
  pub schedule:        ScheduleFrequency,
  /// IANA zone name. Decides which calendar day is "today" for scheduling.
  pub timezone:        String,
  pub customer_status: CustomerStatus,
  pub contact:         ContactSettings,
  pub platforms:       Vec<SocialPlatform>,
  /// Cloud storage root. Assigned once and never changed afterwards.
  pub root_folder:     Option<String>,
  pub is_onboarded:    bool,
  pub created_at:      DateTime<Utc>,
  pub joined_at:       Option<DateTime<Utc>>,
}

impl Subscriber {
  /// Assign the storage root if it has not been assigned yet and return it.
  pub fn ensure_root_folder(&mut self) -> &str {
    let (id, name) = (self.subscriber_id, &self.name);
    self
      .root_folder
      .get_or_insert_with(|| paths::root_folder(id, name))
  }

  /// The subscriber's local calendar day at `now`. A zone name that does not
  /// parse is treated as UTC.
  pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
    match self.timezone.parse::<Tz>() {
      Ok(tz) => now.with_timezone(&tz).date_naive(),
      Err(_) => now.date_naive(),
    }
  }
}

/// Input to [`Pipeline::create_subscriber`](crate::Pipeline::create_subscriber).
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscriber {
  pub name:      String,
  #[serde(default)]
  pub schedule:  ScheduleFrequency,
  #[serde(default = "default_timezone")]
  pub timezone:  String,
  #[serde(default)]
  pub contact:   ContactSettings,
  #[serde(default = "default_platforms")]
  pub platforms: Vec<SocialPlatform>,
}

impl NewSubscriber {
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      schedule:  ScheduleFrequency::default(),
      timezone:  default_timezone(),
      contact:   ContactSettings {
        email: email.into(),
        ..ContactSettings::default()
      },
      platforms: default_platforms(),
    }
  }
}

fn default_timezone() -> String { "UTC".to_owned() }

fn default_platforms() -> Vec<SocialPlatform> { vec![SocialPlatform::LinkedIn] }

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn subscriber_in(timezone: &str) -> Subscriber {
    Subscriber {
      subscriber_id:   Uuid::new_v4(),
      name:            "Jane".into(),
      schedule:        ScheduleFrequency::default(),
      timezone:        timezone.into(),
      customer_status: CustomerStatus::default(),
      contact:         ContactSettings::default(),
      platforms:       Vec::new(),
      root_folder:     None,
      is_onboarded:    false,
      created_at:      Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
      joined_at:       None,
    }
  }

  #[test]
  fn today_follows_the_subscriber_zone() {
    // Tuesday 02:00 UTC is still Monday evening in Chicago.
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap();
    let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    assert_eq!(subscriber_in("America/Chicago").today(now), monday);
    assert_eq!(subscriber_in("UTC").today(now), tuesday);
    assert_eq!(subscriber_in("Asia/Tokyo").today(now), tuesday);
    assert_eq!(subscriber_in("Nowhere/Special").today(now), tuesday);
  }
}
