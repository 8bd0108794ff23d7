//! Cloud-storage folder layout for a subscriber.
//!
//! ```text
//! /<Name>_<id>/
//!   prompt_responses/MM-DD-YYYY[_NN]
//!   prompt_responses/Unassigned_<millis>
//!   review_assets/<millis>
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Root folder for a subscriber: every non-alphanumeric character of the name
/// becomes `_`.
pub fn root_folder(subscriber_id: Uuid, name: &str) -> String {
  let sanitized: String = name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect();
  format!("/{sanitized}_{subscriber_id}")
}

/// Response folder for a prompt delivered on `date`.
///
/// `existing_for_day` is how many of the subscriber's other prompts already
/// target that day. The first gets no suffix; later ones get `_02`, `_03`, …
pub fn prompt_folder(root: &str, date: NaiveDate, existing_for_day: usize) -> String {
  let day = date.format("%m-%d-%Y");
  if existing_for_day == 0 {
    format!("{root}/prompt_responses/{day}")
  } else {
    format!("{root}/prompt_responses/{day}_{:02}", existing_for_day + 1)
  }
}

/// Storage for a capture that did not answer a prompt.
pub fn unassigned_folder(root: &str, at: DateTime<Utc>) -> String {
  format!("{root}/prompt_responses/Unassigned_{}", at.timestamp_millis())
}

/// Where an editor drops cuts for client review.
pub fn review_folder(root: &str, at: DateTime<Utc>) -> String {
  format!("{root}/review_assets/{}", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn root_folder_sanitizes_name() {
    let id = Uuid::nil();
    assert_eq!(
      root_folder(id, "Jane O'Neil-Smith"),
      format!("/Jane_O_Neil_Smith_{id}")
    );
  }

  #[test]
  fn prompt_folder_suffixes_are_ordered() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    assert_eq!(prompt_folder("/r", d, 0), "/r/prompt_responses/03-04-2024");
    assert_eq!(prompt_folder("/r", d, 1), "/r/prompt_responses/03-04-2024_02");
    assert_eq!(prompt_folder("/r", d, 2), "/r/prompt_responses/03-04-2024_03");
  }
}
