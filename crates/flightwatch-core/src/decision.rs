//! The lookup decision engine.
//!
//! A lookup request names a calendar date. Dates close to "now" are looked up
//! straight away; dates further in the future are persisted and picked up by
//! the batch runner on the day; dates too far in the past are dropped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How far back an immediate lookup may reach.
pub const PAST_LIMIT_DAYS: i64 = 10;

/// How far ahead an immediate lookup may reach.
pub const FUTURE_LIMIT_DAYS: i64 = 2;

/// What to do with a lookup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupDecision {
  /// Query the flight-data provider now.
  Immediate,
  /// Persist a scheduled entry for the batch runner.
  Scheduled,
  /// Too far in the past; nothing is looked up or stored.
  Rejected,
}

/// Decide how to handle a lookup for `requested` as seen at `now`.
///
/// The immediate window is the open interval
/// `(now - 10 days, now + 2 days)`. A request exactly on either bound falls
/// outside it: on the lower bound it is rejected, on the upper bound it is
/// scheduled.
pub fn decide(requested: DateTime<Utc>, now: DateTime<Utc>) -> LookupDecision {
  let earliest = now - Duration::days(PAST_LIMIT_DAYS);
  let latest = now + Duration::days(FUTURE_LIMIT_DAYS);

  if earliest < requested && requested < latest {
    LookupDecision::Immediate
  } else if requested < now {
    LookupDecision::Rejected
  } else {
    LookupDecision::Scheduled
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
  }

  #[test]
  fn tomorrow_is_immediate() {
    assert_eq!(
      decide(now() + Duration::days(1), now()),
      LookupDecision::Immediate
    );
  }

  #[test]
  fn every_hour_inside_the_window_is_immediate() {
    let now = now();
    let mut d = now - Duration::days(PAST_LIMIT_DAYS) + Duration::hours(1);
    while d < now + Duration::days(FUTURE_LIMIT_DAYS) {
      assert_eq!(decide(d, now), LookupDecision::Immediate, "at {d}");
      d += Duration::hours(1);
    }
  }

  #[test]
  fn older_than_past_limit_is_rejected() {
    let now = now();
    for days in [11, 12, 30, 365] {
      assert_eq!(
        decide(now - Duration::days(days), now),
        LookupDecision::Rejected
      );
    }
  }

  #[test]
  fn beyond_future_limit_is_scheduled() {
    let now = now();
    for days in [3, 7, 30, 180] {
      assert_eq!(
        decide(now + Duration::days(days), now),
        LookupDecision::Scheduled
      );
    }
  }

  #[test]
  fn lower_bound_is_exclusive() {
    let now = now();
    assert_eq!(
      decide(now - Duration::days(PAST_LIMIT_DAYS), now),
      LookupDecision::Rejected
    );
  }

  #[test]
  fn upper_bound_is_exclusive() {
    let now = now();
    assert_eq!(
      decide(now + Duration::days(FUTURE_LIMIT_DAYS), now),
      LookupDecision::Scheduled
    );
  }
}
