//! Contracts for the two third-party providers.
//!
//! The wire types mirror the subset of the FlightAware AeroAPI and the
//! OpenWeather 5-day forecast payloads that Flightwatch consumes. Concrete
//! HTTP clients live in `flightwatch-providers`; tests substitute fakes.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ProviderError;

// ─── Flight data ─────────────────────────────────────────────────────────────

/// An airport as embedded in an AeroAPI flight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AeroAirport {
  pub code:             Option<String>,
  pub code_icao:        Option<String>,
  pub code_iata:        Option<String>,
  pub name:             Option<String>,
  pub city:             Option<String>,
  pub timezone:         Option<String>,
  pub airport_info_url: Option<String>,
}

/// One flight as returned by `GET /flights/{ident}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeroFlight {
  pub ident:            String,
  pub ident_icao:       Option<String>,
  pub ident_iata:       Option<String>,
  /// The provider's own opaque identifier, stable across refreshes.
  pub fa_flight_id:     String,
  pub operator:         Option<String>,
  pub operator_icao:    Option<String>,
  pub operator_iata:    Option<String>,
  pub flight_number:    Option<String>,
  pub registration:     Option<String>,
  pub status:           Option<String>,
  pub progress_percent: Option<i64>,
  /// Seconds; negative when early.
  pub departure_delay:  Option<i64>,
  pub arrival_delay:    Option<i64>,
  pub route_distance:   Option<i64>,
  #[serde(default)]
  pub diverted:         bool,
  #[serde(default)]
  pub cancelled:        bool,
  pub origin:           Option<AeroAirport>,
  pub destination:      Option<AeroAirport>,
  pub aircraft_type:    Option<String>,

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

/// Body of a successful AeroAPI flights query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AeroFlightsResponse {
  #[serde(default)]
  pub flights: Vec<AeroFlight>,
}

/// Result of a flight-data query that reached the provider and got an
/// answer it understood.
#[derive(Debug, Clone)]
pub enum FlightLookup {
  /// The provider answered; the list may be empty.
  Flights(Vec<AeroFlight>),
  /// The provider refused the query with a 4xx (unknown ident, bad date…).
  Rejected { status: u16, detail: String },
}

/// A flight-status provider.
pub trait FlightDataProvider: Send + Sync {
  /// Flights matching `ident` departing on or after `date`.
  fn flights_by_ident(
    &self,
    ident: String,
    date: NaiveDate,
  ) -> impl Future<Output = Result<FlightLookup, ProviderError>> + Send + '_;

  /// The flight with the provider's own id, as returned in
  /// [`AeroFlight::fa_flight_id`].
  fn flight_by_id(
    &self,
    fa_flight_id: String,
  ) -> impl Future<Output = Result<FlightLookup, ProviderError>> + Send + '_;
}

// ─── Weather ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coord {
  pub lat: f64,
  pub lon: f64,
}

/// The `city` block of a forecast response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCity {
  pub name:     String,
  pub coord:    Option<Coord>,
  pub country:  Option<String>,
  /// Unix seconds.
  pub sunrise:  Option<i64>,
  pub sunset:   Option<i64>,
  pub timezone: Option<i64>,
}

/// One three-hour slot of the forecast list.
///
/// Only `dt_txt` is interpreted; everything else is carried through
/// untouched so the stored entry is the provider's payload verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
  /// `YYYY-MM-DD HH:MM:SS`, UTC.
  pub dt_txt: String,
  #[serde(flatten)]
  pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Body of a successful forecast query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
  #[serde(default)]
  pub list: Vec<ForecastEntry>,
  pub city: ForecastCity,
}

/// Result of a weather query that reached the provider.
#[derive(Debug, Clone)]
pub enum WeatherLookup {
  Forecast(ForecastResponse),
  /// The provider does not know the city.
  NotFound,
  /// Any other non-success status.
  Rejected { status: u16, detail: String },
}

/// A weather-forecast provider.
pub trait WeatherProvider: Send + Sync {
  /// The multi-day forecast for `city`.
  fn forecast(
    &self,
    city: String,
  ) -> impl Future<Output = Result<WeatherLookup, ProviderError>> + Send + '_;
}
