//! Lookup requests and deferred (scheduled) lookups.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Status code recorded on a scheduled entry whose flight the provider
/// could not find.
pub const NOT_FOUND_STATUS: u16 = 404;

/// Status code recorded on a scheduled entry that resolved to a flight.
pub const FOUND_STATUS: u16 = 200;

// ─── Request ─────────────────────────────────────────────────────────────────

/// A caller's request to track `ident` on `selected_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLookupRequest {
  pub ident:         String,
  pub selected_date: NaiveDate,
}

impl FlightLookupRequest {
  /// Trim the ident and reject an empty one.
  pub fn normalized(self) -> Result<Self> {
    let ident = self.ident.trim().to_owned();
    if ident.is_empty() {
      return Err(Error::EmptyIdent);
    }
    Ok(Self { ident, ..self })
  }

  /// The instant the decision engine compares against: midnight UTC at the
  /// start of the selected date.
  pub fn requested_at(&self) -> DateTime<Utc> {
    self.selected_date.and_time(chrono::NaiveTime::MIN).and_utc()
  }
}

// ─── Scheduled entries ───────────────────────────────────────────────────────

/// Input to [`crate::store::FlightStore::schedule_lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledLookup {
  pub ident:       String,
  pub flight_date: NaiveDate,
  pub user_id:     Uuid,
}

/// A lookup deferred to the batch runner.
///
/// Entries are never deleted. Completion is recorded once, together with the
/// status code and (when found) the resulting flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledLookupEntry {
  pub id:                 i64,
  pub ident:              String,
  pub flight_date:        NaiveDate,
  pub user_id:            Uuid,
  pub created_at:         DateTime<Utc>,
  pub lookup_complete:    bool,
  pub lookup_status_code: Option<u16>,
  pub lookup_flight_id:   Option<i64>,
  pub weather_complete:   bool,
}

/// How a scheduled lookup resolved; written by
/// [`crate::store::FlightStore::complete_lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupResolution {
  pub flight_id:        Option<i64>,
  pub status_code:      u16,
  pub weather_complete: bool,
}

impl LookupResolution {
  pub fn found(flight_id: i64, weather_complete: bool) -> Self {
    Self {
      flight_id: Some(flight_id),
      status_code: FOUND_STATUS,
      weather_complete,
    }
  }

  pub fn not_found() -> Self {
    Self {
      flight_id:        None,
      status_code:      NOT_FOUND_STATUS,
      weather_complete: false,
    }
  }
}

// ─── Batch kinds ─────────────────────────────────────────────────────────────

/// The two things the batch runner can be asked to do.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
  /// Resolve today's pending scheduled entries.
  Schedule,
  /// Re-query every stored flight and update its timeline.
  Refresh,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn requested_at_is_midnight_utc() {
    let req = FlightLookupRequest {
      ident:         "UAL123".into(),
      selected_date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
    };
    assert_eq!(req.requested_at().to_rfc3339(), "2024-06-16T00:00:00+00:00");
  }

  #[test]
  fn normalized_trims_and_rejects_empty() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
    let ok = FlightLookupRequest { ident: "  UAL123 ".into(), selected_date: date }
      .normalized()
      .unwrap();
    assert_eq!(ok.ident, "UAL123");

    let empty = FlightLookupRequest { ident: "   ".into(), selected_date: date };
    assert!(matches!(empty.normalized(), Err(Error::EmptyIdent)));
  }

  #[test]
  fn request_parses_from_wire_json() {
    let req: FlightLookupRequest =
      serde_json::from_str(r#"{"ident":"DAL5","selected_date":"2024-07-01"}"#).unwrap();
    assert_eq!(req.selected_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
  }

  #[test]
  fn batch_kind_parses_keywords() {
    assert_eq!(BatchKind::from_str("schedule").unwrap(), BatchKind::Schedule);
    assert_eq!(BatchKind::from_str("refresh").unwrap(), BatchKind::Refresh);
    assert!(BatchKind::from_str("purge").is_err());
    assert_eq!(BatchKind::Refresh.to_string(), "refresh");
  }
}
