//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings and booleans as
//! integers.

use chrono::{DateTime, NaiveDate, Utc};
use flightwatch_core::{
  flight::{FlightDetails, FlightRecord, FlightTimeline},
  forecast::{ForecastDetails, WeatherForecastRecord},
  schedule::ScheduledLookupEntry,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// `?1, ?2, …, ?n` for statements with too many columns to spell out.
pub fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

// ─── Timeline ────────────────────────────────────────────────────────────────

/// Column names of the refreshable part of a flight row, in binding order.
pub const TIMELINE_COLUMNS: [&str; 18] = [
  "status",
  "progress_percent",
  "departure_delay",
  "arrival_delay",
  "diverted",
  "cancelled",
  "scheduled_out",
  "estimated_out",
  "actual_out",
  "scheduled_off",
  "estimated_off",
  "actual_off",
  "scheduled_on",
  "estimated_on",
  "actual_on",
  "scheduled_in",
  "estimated_in",
  "actual_in",
];

/// A [`FlightTimeline`] with its timestamps encoded.
pub struct RawTimeline {
  pub status:           Option<String>,
  pub progress_percent: Option<i64>,
  pub departure_delay:  Option<i64>,
  pub arrival_delay:    Option<i64>,
  pub diverted:         bool,
  pub cancelled:        bool,
  /// `scheduled_out` … `actual_in`, in [`TIMELINE_COLUMNS`] order.
  pub times:            [Option<String>; 12],
}

impl RawTimeline {
  pub fn encode(t: &FlightTimeline) -> Self {
    let times = [
      t.scheduled_out,
      t.estimated_out,
      t.actual_out,
      t.scheduled_off,
      t.estimated_off,
      t.actual_off,
      t.scheduled_on,
      t.estimated_on,
      t.actual_on,
      t.scheduled_in,
      t.estimated_in,
      t.actual_in,
    ]
    .map(|dt| dt.map(encode_dt));

    Self {
      status: t.status.clone(),
      progress_percent: t.progress_percent,
      departure_delay: t.departure_delay,
      arrival_delay: t.arrival_delay,
      diverted: t.diverted,
      cancelled: t.cancelled,
      times,
    }
  }

  /// Read the timeline columns starting at index `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    let mut times: [Option<String>; 12] = Default::default();
    for (i, slot) in times.iter_mut().enumerate() {
      *slot = row.get(at + 6 + i)?;
    }
    Ok(Self {
      status: row.get(at)?,
      progress_percent: row.get(at + 1)?,
      departure_delay: row.get(at + 2)?,
      arrival_delay: row.get(at + 3)?,
      diverted: row.get(at + 4)?,
      cancelled: row.get(at + 5)?,
      times,
    })
  }

  pub fn into_timeline(self) -> Result<FlightTimeline> {
    let [
      scheduled_out,
      estimated_out,
      actual_out,
      scheduled_off,
      estimated_off,
      actual_off,
      scheduled_on,
      estimated_on,
      actual_on,
      scheduled_in,
      estimated_in,
      actual_in,
    ] = self.times;

    Ok(FlightTimeline {
      status:           self.status,
      progress_percent: self.progress_percent,
      departure_delay:  self.departure_delay,
      arrival_delay:    self.arrival_delay,
      diverted:         self.diverted,
      cancelled:        self.cancelled,
      scheduled_out:    decode_opt_dt(scheduled_out)?,
      estimated_out:    decode_opt_dt(estimated_out)?,
      actual_out:       decode_opt_dt(actual_out)?,
      scheduled_off:    decode_opt_dt(scheduled_off)?,
      estimated_off:    decode_opt_dt(estimated_off)?,
      actual_off:       decode_opt_dt(actual_off)?,
      scheduled_on:     decode_opt_dt(scheduled_on)?,
      estimated_on:     decode_opt_dt(estimated_on)?,
      actual_on:        decode_opt_dt(actual_on)?,
      scheduled_in:     decode_opt_dt(scheduled_in)?,
      estimated_in:     decode_opt_dt(estimated_in)?,
      actual_in:        decode_opt_dt(actual_in)?,
    })
  }
}

// ─── Flights ─────────────────────────────────────────────────────────────────

/// Descriptive columns of a flight row, in binding order. The timeline
/// columns follow, then `user_id`.
pub const FLIGHT_DETAIL_COLUMNS: [&str; 23] = [
  "ident",
  "ident_icao",
  "ident_iata",
  "fa_flight_id",
  "operator",
  "operator_icao",
  "operator_iata",
  "flight_number",
  "registration",
  "route_distance",
  "aircraft_type",
  "origin_name",
  "origin_city",
  "origin_code_iata",
  "origin_code_icao",
  "origin_timezone",
  "origin_info_url",
  "destination_name",
  "destination_city",
  "destination_code_iata",
  "destination_code_icao",
  "destination_timezone",
  "destination_info_url",
];

/// Every column bound by an insert, after `recorded_at`.
pub fn flight_insert_columns() -> Vec<&'static str> {
  let mut cols = FLIGHT_DETAIL_COLUMNS.to_vec();
  cols.extend(TIMELINE_COLUMNS);
  cols.push("user_id");
  cols
}

/// The full `SELECT` column list, matching [`RawFlight::from_row`].
pub fn flight_select_columns() -> String {
  let mut cols = vec!["id", "recorded_at"];
  cols.extend(flight_insert_columns());
  cols.extend([
    "weather_forecast_id",
    "weather_forecast_fetched",
    "weather_forecast_status_code",
    "weather_forecast_error",
  ]);
  cols.join(", ")
}

/// Raw values read directly from a `flights` row. `route_distance` is the
/// only integer among the descriptive columns and is carried separately.
pub struct RawFlight {
  pub id:             i64,
  pub recorded_at:    String,
  /// [`FLIGHT_DETAIL_COLUMNS`] minus `route_distance`, in order.
  pub text:           [Option<String>; 22],
  pub route_distance: Option<i64>,
  pub timeline:       RawTimeline,
  pub user_id:        String,

  pub weather_forecast_id:          Option<i64>,
  pub weather_forecast_fetched:     bool,
  pub weather_forecast_status_code: Option<u16>,
  pub weather_forecast_error:       Option<String>,
}

/// Detail columns of a flight prepared for binding.
pub struct RawFlightInsert {
  pub text:           [Option<String>; 22],
  pub route_distance: Option<i64>,
  pub timeline:       RawTimeline,
  pub user_id:        String,
}

impl RawFlightInsert {
  pub fn encode(d: &FlightDetails) -> Self {
    Self {
      text: [
        Some(d.ident.clone()),
        d.ident_icao.clone(),
        d.ident_iata.clone(),
        Some(d.fa_flight_id.clone()),
        d.operator.clone(),
        d.operator_icao.clone(),
        d.operator_iata.clone(),
        d.flight_number.clone(),
        d.registration.clone(),
        d.aircraft_type.clone(),
        d.origin_name.clone(),
        d.origin_city.clone(),
        d.origin_code_iata.clone(),
        d.origin_code_icao.clone(),
        d.origin_timezone.clone(),
        d.origin_info_url.clone(),
        d.destination_name.clone(),
        d.destination_city.clone(),
        d.destination_code_iata.clone(),
        d.destination_code_icao.clone(),
        d.destination_timezone.clone(),
        d.destination_info_url.clone(),
      ],
      route_distance: d.route_distance,
      timeline: RawTimeline::encode(&d.timeline),
      user_id: encode_uuid(d.user_id),
    }
  }

  /// Bind values in [`flight_insert_columns`] order.
  pub fn params(&self) -> Vec<&dyn rusqlite::ToSql> {
    let mut p: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(42);
    for (i, v) in self.text.iter().enumerate() {
      if i == 9 {
        p.push(&self.route_distance);
      }
      p.push(v);
    }
    push_timeline(&mut p, &self.timeline);
    p.push(&self.user_id);
    p
  }
}

/// Append the timeline values in [`TIMELINE_COLUMNS`] order.
pub fn push_timeline<'a>(p: &mut Vec<&'a dyn rusqlite::ToSql>, t: &'a RawTimeline) {
  p.push(&t.status);
  p.push(&t.progress_percent);
  p.push(&t.departure_delay);
  p.push(&t.arrival_delay);
  p.push(&t.diverted);
  p.push(&t.cancelled);
  for time in &t.times {
    p.push(time);
  }
}

impl RawFlight {
  /// Read a row selected with [`flight_select_columns`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    // id, recorded_at, 23 detail columns, 18 timeline columns, user_id,
    // then the four weather columns.
    let mut text: [Option<String>; 22] = Default::default();
    let mut col = 2;
    let mut route_distance = None;
    for i in 0..FLIGHT_DETAIL_COLUMNS.len() {
      if i == 9 {
        route_distance = row.get(col)?;
      } else {
        text[if i < 9 { i } else { i - 1 }] = row.get(col)?;
      }
      col += 1;
    }
    let timeline = RawTimeline::from_row(row, col)?;
    col += TIMELINE_COLUMNS.len();

    Ok(Self {
      id: row.get(0)?,
      recorded_at: row.get(1)?,
      text,
      route_distance,
      timeline,
      user_id: row.get(col)?,
      weather_forecast_id: row.get(col + 1)?,
      weather_forecast_fetched: row.get(col + 2)?,
      weather_forecast_status_code: row.get(col + 3)?,
      weather_forecast_error: row.get(col + 4)?,
    })
  }

  pub fn into_record(self) -> Result<FlightRecord> {
    let [
      ident,
      ident_icao,
      ident_iata,
      fa_flight_id,
      operator,
      operator_icao,
      operator_iata,
      flight_number,
      registration,
      aircraft_type,
      origin_name,
      origin_city,
      origin_code_iata,
      origin_code_icao,
      origin_timezone,
      origin_info_url,
      destination_name,
      destination_city,
      destination_code_iata,
      destination_code_icao,
      destination_timezone,
      destination_info_url,
    ] = self.text;

    let details = FlightDetails {
      ident: ident.unwrap_or_default(),
      ident_icao,
      ident_iata,
      fa_flight_id: fa_flight_id.unwrap_or_default(),
      operator,
      operator_icao,
      operator_iata,
      flight_number,
      registration,
      route_distance: self.route_distance,
      aircraft_type,
      origin_name,
      origin_city,
      origin_code_iata,
      origin_code_icao,
      origin_timezone,
      origin_info_url,
      destination_name,
      destination_city,
      destination_code_iata,
      destination_code_icao,
      destination_timezone,
      destination_info_url,
      timeline: self.timeline.into_timeline()?,
      user_id: decode_uuid(&self.user_id)?,
    };

    Ok(FlightRecord {
      id: self.id,
      recorded_at: decode_dt(&self.recorded_at)?,
      details,
      weather_forecast_id: self.weather_forecast_id,
      weather_forecast_fetched: self.weather_forecast_fetched,
      weather_forecast_status_code: self.weather_forecast_status_code,
      weather_forecast_error: self.weather_forecast_error,
    })
  }
}

// ─── Forecasts ───────────────────────────────────────────────────────────────

pub const FORECAST_COLUMNS: &str = "id, recorded_at, flight_id, fa_flight_id, \
  destination_city, forecast_city, coord_lat, coord_lon, country, sunrise, \
  sunset, scheduled_departure, weather, user_id";

/// Raw values read directly from a `forecasts` row.
pub struct RawForecast {
  pub id:                  i64,
  pub recorded_at:         String,
  pub flight_id:           i64,
  pub fa_flight_id:        String,
  pub destination_city:    String,
  pub forecast_city:       String,
  pub coord_lat:           Option<f64>,
  pub coord_lon:           Option<f64>,
  pub country:             Option<String>,
  pub sunrise:             Option<i64>,
  pub sunset:              Option<i64>,
  pub scheduled_departure: Option<String>,
  pub weather:             Option<String>,
  pub user_id:             String,
}

impl RawForecast {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      recorded_at:         row.get(1)?,
      flight_id:           row.get(2)?,
      fa_flight_id:        row.get(3)?,
      destination_city:    row.get(4)?,
      forecast_city:       row.get(5)?,
      coord_lat:           row.get(6)?,
      coord_lon:           row.get(7)?,
      country:             row.get(8)?,
      sunrise:             row.get(9)?,
      sunset:              row.get(10)?,
      scheduled_departure: row.get(11)?,
      weather:             row.get(12)?,
      user_id:             row.get(13)?,
    })
  }

  pub fn into_record(self) -> Result<WeatherForecastRecord> {
    Ok(WeatherForecastRecord {
      id:          self.id,
      recorded_at: decode_dt(&self.recorded_at)?,
      details:     ForecastDetails {
        flight_id:           self.flight_id,
        fa_flight_id:        self.fa_flight_id,
        destination_city:    self.destination_city,
        forecast_city:       self.forecast_city,
        coord_lat:           self.coord_lat,
        coord_lon:           self.coord_lon,
        country:             self.country,
        sunrise:             self.sunrise,
        sunset:              self.sunset,
        scheduled_departure: decode_opt_dt(self.scheduled_departure)?,
        weather:             self.weather,
        user_id:             decode_uuid(&self.user_id)?,
      },
    })
  }
}

// ─── Scheduled lookups ───────────────────────────────────────────────────────

pub const SCHEDULE_COLUMNS: &str = "id, ident, flight_date, user_id, created_at, \
  lookup_complete, lookup_status_code, lookup_flight_id, weather_complete";

/// Raw values read directly from a `schedule_lookup` row.
pub struct RawScheduledLookup {
  pub id:                 i64,
  pub ident:              String,
  pub flight_date:        String,
  pub user_id:            String,
  pub created_at:         String,
  pub lookup_complete:    bool,
  pub lookup_status_code: Option<u16>,
  pub lookup_flight_id:   Option<i64>,
  pub weather_complete:   bool,
}

impl RawScheduledLookup {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      ident:              row.get(1)?,
      flight_date:        row.get(2)?,
      user_id:            row.get(3)?,
      created_at:         row.get(4)?,
      lookup_complete:    row.get(5)?,
      lookup_status_code: row.get(6)?,
      lookup_flight_id:   row.get(7)?,
      weather_complete:   row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<ScheduledLookupEntry> {
    Ok(ScheduledLookupEntry {
      id:                 self.id,
      ident:              self.ident,
      flight_date:        decode_date(&self.flight_date)?,
      user_id:            decode_uuid(&self.user_id)?,
      created_at:         decode_dt(&self.created_at)?,
      lookup_complete:    self.lookup_complete,
      lookup_status_code: self.lookup_status_code,
      lookup_flight_id:   self.lookup_flight_id,
      weather_complete:   self.weather_complete,
    })
  }
}
