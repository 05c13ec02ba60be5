//! Stored weather forecasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  flight::FlightRecord,
  provider::{ForecastEntry, ForecastResponse},
};

/// Input to [`crate::store::FlightStore::record_forecast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDetails {
  pub flight_id:           i64,
  pub fa_flight_id:        String,
  /// The city that was queried (the flight's destination).
  pub destination_city:    String,
  /// The city the provider resolved the query to.
  pub forecast_city:       String,
  pub coord_lat:           Option<f64>,
  pub coord_lon:           Option<f64>,
  pub country:             Option<String>,
  pub sunrise:             Option<i64>,
  pub sunset:              Option<i64>,
  pub scheduled_departure: Option<DateTime<Utc>>,
  /// The forecast slot matching the departure date, serialized verbatim.
  /// `None` when no slot falls on that date.
  pub weather:             Option<String>,
  pub user_id:             Uuid,
}

impl ForecastDetails {
  /// Build the row for `flight` from a forecast queried for `city`.
  pub fn from_response(
    flight: &FlightRecord,
    city: &str,
    response: &ForecastResponse,
  ) -> Result<Self> {
    let departure = flight.scheduled_departure();
    let weather = select_entry(&response.list, departure)
      .map(serde_json::to_string)
      .transpose()?;

    Ok(Self {
      flight_id: flight.id,
      fa_flight_id: flight.details.fa_flight_id.clone(),
      destination_city: city.to_owned(),
      forecast_city: response.city.name.clone(),
      coord_lat: response.city.coord.map(|c| c.lat),
      coord_lon: response.city.coord.map(|c| c.lon),
      country: response.city.country.clone(),
      sunrise: response.city.sunrise,
      sunset: response.city.sunset,
      scheduled_departure: departure,
      weather,
      user_id: flight.details.user_id,
    })
  }
}

/// The first forecast slot on the same calendar date as `departure`.
///
/// Matching is a prefix comparison of `dt_txt` against `YYYY-MM-DD`.
pub fn select_entry(
  entries: &[ForecastEntry],
  departure: Option<DateTime<Utc>>,
) -> Option<&ForecastEntry> {
  let date = departure?.format("%Y-%m-%d").to_string();
  entries.iter().find(|e| e.dt_txt.starts_with(&date))
}

/// A stored forecast row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecastRecord {
  pub id:          i64,
  pub recorded_at: DateTime<Utc>,
  #[serde(flatten)]
  pub details:     ForecastDetails,
}
