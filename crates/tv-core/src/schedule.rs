//! Delivery scheduler. Picks the calendar days a subscriber receives prompts.
//!
//! Everything here is a pure function of its inputs: the caller supplies
//! "today" (from an injected [`Clock`](crate::clock::Clock)), the set of days
//! already committed, and the cadence. The fixed-weekday interpretation of
//! each cadence lives in [`CadencePolicy`] so it can be swapped without
//! touching the search loop.

use std::{collections::BTreeSet, sync::Arc};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ─── Cadence ─────────────────────────────────────────────────────────────────

/// How often a subscriber receives prompts.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
  #[default]
  WeekdaysOnly,
  WeekendsOnly,
  OncePerWeek,
  TwicePerWeek,
  ThricePerWeek,
  /// Any value we do not recognise. Every weekday is allowed.
  #[serde(other)]
  Unrestricted,
}

impl ScheduleFrequency {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::WeekdaysOnly => "weekdays_only",
      Self::WeekendsOnly => "weekends_only",
      Self::OncePerWeek => "once_per_week",
      Self::TwicePerWeek => "twice_per_week",
      Self::ThricePerWeek => "thrice_per_week",
      Self::Unrestricted => "unrestricted",
    }
  }
}

impl std::fmt::Display for ScheduleFrequency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Policy table ────────────────────────────────────────────────────────────

/// Which weekdays each cadence may land on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadencePolicy {
  pub weekdays_only:   Vec<Weekday>,
  pub weekends_only:   Vec<Weekday>,
  pub once_per_week:   Vec<Weekday>,
  pub twice_per_week:  Vec<Weekday>,
  pub thrice_per_week: Vec<Weekday>,
}

impl Default for CadencePolicy {
  fn default() -> Self {
    use Weekday::*;
    Self {
      weekdays_only:   vec![Mon, Tue, Wed, Thu, Fri],
      weekends_only:   vec![Sat, Sun],
      once_per_week:   vec![Wed],
      twice_per_week:  vec![Tue, Thu],
      thrice_per_week: vec![Mon, Wed, Fri],
    }
  }
}

impl CadencePolicy {
  /// `true` if `day` is a permitted delivery weekday for `frequency`.
  pub fn allows(&self, frequency: ScheduleFrequency, day: Weekday) -> bool {
    let days = match frequency {
      ScheduleFrequency::WeekdaysOnly => &self.weekdays_only,
      ScheduleFrequency::WeekendsOnly => &self.weekends_only,
      ScheduleFrequency::OncePerWeek => &self.once_per_week,
      ScheduleFrequency::TwicePerWeek => &self.twice_per_week,
      ScheduleFrequency::ThricePerWeek => &self.thrice_per_week,
      ScheduleFrequency::Unrestricted => return true,
    };
    days.contains(&day)
  }
}

// ─── Holidays ────────────────────────────────────────────────────────────────

/// A predicate over calendar days on which nothing is delivered.
pub trait HolidayCalendar: Send + Sync {
  fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl<F> HolidayCalendar for F
where
  F: Fn(NaiveDate) -> bool + Send + Sync,
{
  fn is_holiday(&self, date: NaiveDate) -> bool { self(date) }
}

/// Holidays matched on month and day only, regardless of year.
///
/// No observed-day shifting: a holiday that falls on a Saturday is not moved
/// to the Friday before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHolidays {
  /// `(month, day)` pairs, 1-based.
  pub days: Vec<(u32, u32)>,
}

impl FixedHolidays {
  /// New Year's Day, Independence Day and Christmas Day.
  pub fn us_federal_fixed() -> Self {
    Self { days: vec![(1, 1), (7, 4), (12, 25)] }
  }
}

impl Default for FixedHolidays {
  fn default() -> Self { Self::us_federal_fixed() }
}

impl HolidayCalendar for FixedHolidays {
  fn is_holiday(&self, date: NaiveDate) -> bool {
    self.days.contains(&(date.month(), date.day()))
  }
}

// ─── Slot ────────────────────────────────────────────────────────────────────

/// Result of a [`Scheduler::next_slot`] search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
  /// The first eligible, uncommitted day.
  Open(NaiveDate),
  /// Nothing qualified within the search horizon. `fallback` is "today";
  /// callers decide whether to use it.
  Exhausted { fallback: NaiveDate },
}

impl Slot {
  pub fn date(self) -> NaiveDate {
    match self {
      Self::Open(date) => date,
      Self::Exhausted { fallback } => fallback,
    }
  }

  pub fn is_exhausted(self) -> bool { matches!(self, Self::Exhausted { .. }) }
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

/// Default number of days searched ahead of today.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

#[derive(Clone)]
pub struct Scheduler {
  policy:       CadencePolicy,
  holidays:     Arc<dyn HolidayCalendar>,
  horizon_days: u32,
}

impl Default for Scheduler {
  fn default() -> Self { Self::new(Arc::new(FixedHolidays::default())) }
}

impl std::fmt::Debug for Scheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scheduler")
      .field("policy", &self.policy)
      .field("horizon_days", &self.horizon_days)
      .finish_non_exhaustive()
  }
}

impl Scheduler {
  pub fn new(holidays: Arc<dyn HolidayCalendar>) -> Self {
    Self {
      policy: CadencePolicy::default(),
      holidays,
      horizon_days: DEFAULT_HORIZON_DAYS,
    }
  }

  pub fn with_policy(mut self, policy: CadencePolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_horizon(mut self, days: u32) -> Self {
    self.horizon_days = days;
    self
  }

  pub fn policy(&self) -> &CadencePolicy { &self.policy }

  pub fn horizon_days(&self) -> u32 { self.horizon_days }

  pub fn is_holiday(&self, date: NaiveDate) -> bool { self.holidays.is_holiday(date) }

  /// Weekday rule and holiday calendar only; ignores committed days.
  pub fn is_eligible(&self, date: NaiveDate, frequency: ScheduleFrequency) -> bool {
    self.policy.allows(frequency, date.weekday()) && !self.is_holiday(date)
  }

  /// The first eligible day after `today` that is not in `committed`.
  pub fn next_slot(
    &self,
    today: NaiveDate,
    committed: &BTreeSet<NaiveDate>,
    frequency: ScheduleFrequency,
  ) -> Slot {
    let found = days_after(today, self.horizon_days)
      .find(|day| self.is_eligible(*day, frequency) && !committed.contains(day));

    match found {
      Some(day) => {
        tracing::debug!(%day, %frequency, "found delivery slot");
        Slot::Open(day)
      }
      None => Slot::Exhausted { fallback: today },
    }
  }

  /// Every eligible day in the `window_days` days after `today`, ascending.
  /// Committed days are not consulted.
  pub fn forecast(
    &self,
    today: NaiveDate,
    frequency: ScheduleFrequency,
    window_days: u32,
  ) -> Vec<NaiveDate> {
    days_after(today, window_days)
      .filter(|day| self.is_eligible(*day, frequency))
      .collect()
  }
}

/// `today + 1 ..= today + count`.
fn days_after(today: NaiveDate, count: u32) -> impl Iterator<Item = NaiveDate> {
  (1..=u64::from(count)).filter_map(move |n| today.checked_add_days(Days::new(n)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn weekdays_skip_new_year_and_start_tomorrow() {
    let s = Scheduler::default();
    let slot = s.next_slot(date(2024, 1, 1), &BTreeSet::new(), ScheduleFrequency::WeekdaysOnly);
    assert_eq!(slot, Slot::Open(date(2024, 1, 2)));
  }

  #[test]
  fn weekdays_skip_the_weekend() {
    let s = Scheduler::default();
    // Friday 2024-01-05; Saturday and Sunday are not eligible.
    let slot = s.next_slot(date(2024, 1, 5), &BTreeSet::new(), ScheduleFrequency::WeekdaysOnly);
    assert_eq!(slot, Slot::Open(date(2024, 1, 8)));
  }

  #[test]
  fn weekends_skip_committed_saturday() {
    let s = Scheduler::default();
    let committed = BTreeSet::from([date(2024, 1, 6)]);
    let slot = s.next_slot(date(2024, 1, 1), &committed, ScheduleFrequency::WeekendsOnly);
    assert_eq!(slot, Slot::Open(date(2024, 1, 7)));
  }

  #[test]
  fn fixed_weekday_cadences() {
    let s = Scheduler::default();
    let monday = date(2024, 3, 4);
    let none = BTreeSet::new();

    assert_eq!(
      s.next_slot(monday, &none, ScheduleFrequency::OncePerWeek).date().weekday(),
      Weekday::Wed
    );
    assert_eq!(
      s.next_slot(monday, &none, ScheduleFrequency::TwicePerWeek).date().weekday(),
      Weekday::Tue
    );
    // Monday itself is excluded because the search starts tomorrow.
    assert_eq!(
      s.next_slot(monday, &none, ScheduleFrequency::ThricePerWeek),
      Slot::Open(date(2024, 3, 6))
    );
  }

  #[test]
  fn custom_policy_replaces_fixed_weekdays() {
    let policy = CadencePolicy { once_per_week: vec![Weekday::Fri], ..CadencePolicy::default() };
    let s = Scheduler::default().with_policy(policy);
    assert!(s.policy().allows(ScheduleFrequency::OncePerWeek, Weekday::Fri));
    assert!(!s.policy().allows(ScheduleFrequency::OncePerWeek, Weekday::Wed));

    // Monday 2024-03-04: Wednesday no longer qualifies, Friday does.
    let monday = date(2024, 3, 4);
    let slot = s.next_slot(monday, &BTreeSet::new(), ScheduleFrequency::OncePerWeek);
    assert_eq!(slot, Slot::Open(date(2024, 3, 8)));

    let committed = BTreeSet::from([date(2024, 3, 8)]);
    let slot = s.next_slot(monday, &committed, ScheduleFrequency::OncePerWeek);
    assert_eq!(slot, Slot::Open(date(2024, 3, 15)));

    // Other cadences keep their defaults.
    let slot = s.next_slot(monday, &BTreeSet::new(), ScheduleFrequency::TwicePerWeek);
    assert_eq!(slot, Slot::Open(date(2024, 3, 5)));
  }

  #[test]
  fn unrestricted_allows_any_day() {
    let s = Scheduler::default();
    let slot = s.next_slot(date(2024, 3, 8), &BTreeSet::new(), ScheduleFrequency::Unrestricted);
    assert_eq!(slot, Slot::Open(date(2024, 3, 9)));
  }

  #[test]
  fn unknown_cadence_deserializes_as_unrestricted() {
    let f: ScheduleFrequency = serde_json::from_str("\"fortnightly\"").unwrap();
    assert_eq!(f, ScheduleFrequency::Unrestricted);
  }

  #[test]
  fn exhausted_when_every_day_is_taken() {
    let s = Scheduler::default().with_horizon(7);
    let today = date(2024, 3, 4);
    let committed: BTreeSet<_> = days_after(today, 7).collect();
    let slot = s.next_slot(today, &committed, ScheduleFrequency::Unrestricted);
    assert_eq!(slot, Slot::Exhausted { fallback: today });
    assert!(slot.is_exhausted());
  }

  #[test]
  fn holidays_are_year_agnostic() {
    let h = FixedHolidays::default();
    assert!(h.is_holiday(date(1999, 7, 4)));
    assert!(h.is_holiday(date(2031, 12, 25)));
    assert!(!h.is_holiday(date(2024, 11, 28)));
  }

  #[test]
  fn injected_calendar_is_honoured() {
    let s = Scheduler::new(Arc::new(|d: NaiveDate| d == NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
    let slot = s.next_slot(date(2024, 3, 4), &BTreeSet::new(), ScheduleFrequency::WeekdaysOnly);
    assert_eq!(slot, Slot::Open(date(2024, 3, 6)));
  }

  #[test]
  fn forecast_ignores_commitments_and_holidays_are_dropped() {
    let s = Scheduler::default();
    // Window covering Christmas week 2024: Wed 12/25 is a holiday.
    let days = s.forecast(date(2024, 12, 22), ScheduleFrequency::ThricePerWeek, 7);
    assert_eq!(days, vec![date(2024, 12, 23), date(2024, 12, 27)]);
  }

  #[test]
  fn forecast_is_ascending_and_rule_conformant() {
    let s = Scheduler::default();
    let days = s.forecast(date(2024, 1, 1), ScheduleFrequency::WeekendsOnly, 30);
    assert!(days.windows(2).all(|w| w[0] < w[1]));
    assert!(days.iter().all(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    assert_eq!(days.len(), 8);
  }

  #[test]
  fn forecast_may_be_empty() {
    let s = Scheduler::default();
    assert!(s.forecast(date(2024, 3, 4), ScheduleFrequency::WeekendsOnly, 3).is_empty());
  }

  #[test]
  fn next_slot_never_returns_ineligible_day() {
    let s = Scheduler::default();
    let mut today = date(2024, 1, 1);
    for _ in 0..366 {
      for f in [
        ScheduleFrequency::WeekdaysOnly,
        ScheduleFrequency::WeekendsOnly,
        ScheduleFrequency::OncePerWeek,
        ScheduleFrequency::TwicePerWeek,
        ScheduleFrequency::ThricePerWeek,
      ] {
        if let Slot::Open(day) = s.next_slot(today, &BTreeSet::new(), f) {
          assert!(s.is_eligible(day, f), "{day} for {f}");
          assert!(day > today);
        }
      }
      today = today.succ_opt().unwrap();
    }
  }
}
