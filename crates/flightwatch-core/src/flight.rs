//! Stored flights.
//!
//! Provider payloads nest the origin and destination airports; a
//! [`FlightDetails`] carries them flattened into prefixed fields so that a
//! stored row never holds a nested object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::{AeroAirport, AeroFlight};

// ─── Timeline ────────────────────────────────────────────────────────────────

/// The fields of a flight that change while it is tracked. A status refresh
/// overwrites exactly these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightTimeline {
  pub status:           Option<String>,
  pub progress_percent: Option<i64>,
  pub departure_delay:  Option<i64>,
  pub arrival_delay:    Option<i64>,
  pub diverted:         bool,
  pub cancelled:        bool,

  pub scheduled_out: Option<DateTime<Utc>>,
  pub estimated_out: Option<DateTime<Utc>>,
  pub actual_out:    Option<DateTime<Utc>>,
  pub scheduled_off: Option<DateTime<Utc>>,
  pub estimated_off: Option<DateTime<Utc>>,
  pub actual_off:    Option<DateTime<Utc>>,
  pub scheduled_on:  Option<DateTime<Utc>>,
  pub estimated_on:  Option<DateTime<Utc>>,
  pub actual_on:     Option<DateTime<Utc>>,
  pub scheduled_in:  Option<DateTime<Utc>>,
  pub estimated_in:  Option<DateTime<Utc>>,
  pub actual_in:     Option<DateTime<Utc>>,
}

impl From<&AeroFlight> for FlightTimeline {
  fn from(f: &AeroFlight) -> Self {
    Self {
      status:           f.status.clone(),
      progress_percent: f.progress_percent,
      departure_delay:  f.departure_delay,
      arrival_delay:    f.arrival_delay,
      diverted:         f.diverted,
      cancelled:        f.cancelled,
      scheduled_out:    f.scheduled_out,
      estimated_out:    f.estimated_out,
      actual_out:       f.actual_out,
      scheduled_off:    f.scheduled_off,
      estimated_off:    f.estimated_off,
      actual_off:       f.actual_off,
      scheduled_on:     f.scheduled_on,
      estimated_on:     f.estimated_on,
      actual_on:        f.actual_on,
      scheduled_in:     f.scheduled_in,
      estimated_in:     f.estimated_in,
      actual_in:        f.actual_in,
    }
  }
}

// ─── Airport ─────────────────────────────────────────────────────────────────

/// An airport reduced to the columns Flightwatch stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportColumns {
  pub name:      Option<String>,
  pub city:      Option<String>,
  pub code_iata: Option<String>,
  pub code_icao: Option<String>,
  pub timezone:  Option<String>,
  pub info_url:  Option<String>,
}

impl From<&AeroAirport> for AirportColumns {
  fn from(a: &AeroAirport) -> Self {
    Self {
      name:      a.name.clone(),
      city:      a.city.clone(),
      code_iata: a.code_iata.clone(),
      code_icao: a.code_icao.clone().or_else(|| a.code.clone()),
      timezone:  a.timezone.clone(),
      info_url:  a.airport_info_url.clone(),
    }
  }
}

// ─── FlightDetails ───────────────────────────────────────────────────────────

/// Input to [`crate::store::FlightStore::record_flight`]: everything about a
/// flight except the store-assigned id, timestamp and weather columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDetails {
  pub ident:          String,
  pub ident_icao:     Option<String>,
  pub ident_iata:     Option<String>,
  pub fa_flight_id:   String,
  pub operator:       Option<String>,
  pub operator_icao:  Option<String>,
  pub operator_iata:  Option<String>,
  pub flight_number:  Option<String>,
  pub registration:   Option<String>,
  pub route_distance: Option<i64>,
  pub aircraft_type:  Option<String>,

  pub origin_name:      Option<String>,
  pub origin_city:      Option<String>,
  pub origin_code_iata: Option<String>,
  pub origin_code_icao: Option<String>,
  pub origin_timezone:  Option<String>,
  pub origin_info_url:  Option<String>,

  pub destination_name:      Option<String>,
  pub destination_city:      Option<String>,
  pub destination_code_iata: Option<String>,
  pub destination_code_icao: Option<String>,
  pub destination_timezone:  Option<String>,
  pub destination_info_url:  Option<String>,

  #[serde(flatten)]
  pub timeline: FlightTimeline,

  /// The authenticated user the lookup was made for.
  pub user_id: Uuid,
}

impl FlightDetails {
  /// Flatten a provider flight for storage under `user_id`.
  pub fn from_provider(flight: &AeroFlight, user_id: Uuid) -> Self {
    let origin = flight
      .origin
      .as_ref()
      .map(AirportColumns::from)
      .unwrap_or_default();
    let destination = flight
      .destination
      .as_ref()
      .map(AirportColumns::from)
      .unwrap_or_default();

    Self {
      ident:          flight.ident.clone(),
      ident_icao:     flight.ident_icao.clone(),
      ident_iata:     flight.ident_iata.clone(),
      fa_flight_id:   flight.fa_flight_id.clone(),
      operator:       flight.operator.clone(),
      operator_icao:  flight.operator_icao.clone(),
      operator_iata:  flight.operator_iata.clone(),
      flight_number:  flight.flight_number.clone(),
      registration:   flight.registration.clone(),
      route_distance: flight.route_distance,
      aircraft_type:  flight.aircraft_type.clone(),

      origin_name:      origin.name,
      origin_city:      origin.city,
      origin_code_iata: origin.code_iata,
      origin_code_icao: origin.code_icao,
      origin_timezone:  origin.timezone,
      origin_info_url:  origin.info_url,

      destination_name:      destination.name,
      destination_city:      destination.city,
      destination_code_iata: destination.code_iata,
      destination_code_icao: destination.code_icao,
      destination_timezone:  destination.timezone,
      destination_info_url:  destination.info_url,

      timeline: FlightTimeline::from(flight),
      user_id,
    }
  }
}

// ─── Weather attachment ──────────────────────────────────────────────────────

/// The outcome of trying to attach a weather forecast to a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ForecastStatus {
  Fetched { forecast_id: i64 },
  NotFetched {
    /// Provider status, if the provider answered at all.
    status_code: Option<u16>,
    error:       String,
  },
}

impl ForecastStatus {
  pub fn is_fetched(&self) -> bool { matches!(self, Self::Fetched { .. }) }
}

// ─── FlightRecord ────────────────────────────────────────────────────────────

/// A stored flight row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
  pub id:          i64,
  /// Server-assigned insert timestamp.
  pub recorded_at: DateTime<Utc>,
  #[serde(flatten)]
  pub details:     FlightDetails,

  pub weather_forecast_id:          Option<i64>,
  pub weather_forecast_fetched:     bool,
  pub weather_forecast_status_code: Option<u16>,
  pub weather_forecast_error:       Option<String>,
}

impl FlightRecord {
  /// The departure the weather forecast is matched against.
  pub fn scheduled_departure(&self) -> Option<DateTime<Utc>> {
    self.details.timeline.scheduled_out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn aero_flight() -> AeroFlight {
    serde_json::from_value(serde_json::json!({
      "ident": "UAL123",
      "ident_icao": "UAL123",
      "ident_iata": "UA123",
      "fa_flight_id": "UAL123-1718000000-airline-0123",
      "operator": "UAL",
      "operator_iata": "UA",
      "flight_number": "123",
      "status": "Scheduled",
      "route_distance": 2565,
      "origin": {
        "code": "KSFO",
        "code_iata": "SFO",
        "name": "San Francisco Int'l",
        "city": "San Francisco",
        "timezone": "America/Los_Angeles",
        "airport_info_url": "/airports/KSFO"
      },
      "destination": {
        "code": "KEWR",
        "code_icao": "KEWR",
        "code_iata": "EWR",
        "name": "Newark Liberty Intl",
        "city": "Newark"
      },
      "aircraft_type": "B39M",
      "scheduled_out": "2024-06-16T15:00:00Z",
      "scheduled_in": "2024-06-16T23:30:00Z"
    }))
    .unwrap()
  }

  #[test]
  fn from_provider_flattens_airports() {
    let user = Uuid::new_v4();
    let d = FlightDetails::from_provider(&aero_flight(), user);

    assert_eq!(d.user_id, user);
    assert_eq!(d.origin_city.as_deref(), Some("San Francisco"));
    assert_eq!(d.origin_code_iata.as_deref(), Some("SFO"));
    // Falls back to `code` when `code_icao` is absent.
    assert_eq!(d.origin_code_icao.as_deref(), Some("KSFO"));
    assert_eq!(d.origin_info_url.as_deref(), Some("/airports/KSFO"));
    assert_eq!(d.destination_city.as_deref(), Some("Newark"));
    assert_eq!(d.destination_code_iata.as_deref(), Some("EWR"));
    assert!(d.destination_timezone.is_none());
  }

  #[test]
  fn from_provider_copies_timeline() {
    let d = FlightDetails::from_provider(&aero_flight(), Uuid::new_v4());
    assert_eq!(d.timeline.status.as_deref(), Some("Scheduled"));
    assert!(!d.timeline.diverted);
    assert!(!d.timeline.cancelled);
    assert!(d.timeline.scheduled_out.is_some());
    assert!(d.timeline.actual_out.is_none());
  }

  #[test]
  fn missing_airports_flatten_to_nulls() {
    let mut flight = aero_flight();
    flight.origin = None;
    flight.destination = None;
    let d = FlightDetails::from_provider(&flight, Uuid::new_v4());
    assert!(d.origin_name.is_none());
    assert!(d.destination_city.is_none());
  }

  #[test]
  fn serialized_record_has_no_nested_objects() {
    let record = FlightRecord {
      id:                           1,
      recorded_at:                  Utc::now(),
      details:                      FlightDetails::from_provider(&aero_flight(), Uuid::new_v4()),
      weather_forecast_id:          None,
      weather_forecast_fetched:     false,
      weather_forecast_status_code: None,
      weather_forecast_error:       None,
    };
    let value = serde_json::to_value(&record).unwrap();
    let obj = value.as_object().unwrap();
    assert!(obj.values().all(|v| !v.is_object() && !v.is_array()));
    assert_eq!(obj["destination_city"], "Newark");
    assert_eq!(obj["status"], "Scheduled");
  }
}
