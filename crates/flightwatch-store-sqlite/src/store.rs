//! SQLite implementation of [`FlightStore`]: [`SqliteStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use flightwatch_core::{
  flight::{FlightDetails, FlightRecord, FlightTimeline, ForecastStatus},
  forecast::{ForecastDetails, WeatherForecastRecord},
  schedule::{LookupResolution, NewScheduledLookup, ScheduledLookupEntry},
  store::FlightStore,
};

use crate::{
  encode::{
    FORECAST_COLUMNS, RawFlight, RawFlightInsert, RawForecast, RawScheduledLookup,
    RawTimeline, SCHEDULE_COLUMNS, TIMELINE_COLUMNS, encode_date, encode_dt,
    encode_uuid, flight_insert_columns, flight_select_columns, placeholders,
    push_timeline,
  },
  schema::{RESET_CLAIMS, SCHEMA},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Flightwatch store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute(RESET_CLAIMS, [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_schedule(
    &self,
    where_clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<ScheduledLookupEntry>> {
    let raws: Vec<RawScheduledLookup> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SCHEDULE_COLUMNS} FROM schedule_lookup {where_clause} ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawScheduledLookup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScheduledLookup::into_entry).collect()
  }

  async fn query_flights(
    &self,
    where_clause: &'static str,
    params: Vec<Value>,
  ) -> Result<Vec<FlightRecord>> {
    let raws: Vec<RawFlight> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM flights {where_clause} ORDER BY id",
          flight_select_columns()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawFlight::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFlight::into_record).collect()
  }
}

// ─── FlightStore impl ────────────────────────────────────────────────────────

impl FlightStore for SqliteStore {
  type Error = Error;

  // ── Scheduled lookups ─────────────────────────────────────────────────────

  async fn schedule_lookup(
    &self,
    input: NewScheduledLookup,
  ) -> Result<ScheduledLookupEntry> {
    let created_at = Utc::now();

    let ident_str   = input.ident.clone();
    let date_str    = encode_date(input.flight_date);
    let user_str    = encode_uuid(input.user_id);
    let created_str = encode_dt(created_at);

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schedule_lookup (ident, flight_date, user_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![ident_str, date_str, user_str, created_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ScheduledLookupEntry {
      id,
      ident: input.ident,
      flight_date: input.flight_date,
      user_id: input.user_id,
      created_at,
      lookup_complete: false,
      lookup_status_code: None,
      lookup_flight_id: None,
      weather_complete: false,
    })
  }

  async fn get_scheduled_lookup(&self, id: i64) -> Result<Option<ScheduledLookupEntry>> {
    let raw: Option<RawScheduledLookup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SCHEDULE_COLUMNS} FROM schedule_lookup WHERE id = ?1"),
            rusqlite::params![id],
            RawScheduledLookup::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawScheduledLookup::into_entry).transpose()
  }

  async fn list_scheduled_lookups(&self, user_id: Uuid) -> Result<Vec<ScheduledLookupEntry>> {
    self
      .query_schedule("WHERE user_id = ?1", vec![encode_uuid(user_id)])
      .await
  }

  async fn pending_lookups(&self, flight_date: NaiveDate) -> Result<Vec<ScheduledLookupEntry>> {
    self
      .query_schedule(
        "WHERE flight_date = ?1 AND lookup_complete = 0",
        vec![encode_date(flight_date)],
      )
      .await
  }

  async fn claim_lookup(&self, id: i64) -> Result<bool> {
    // A single conditional UPDATE, so two racing claims cannot both match.
    let claimed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE schedule_lookup
              SET lookup_claimed = 1
            WHERE id = ?1 AND lookup_complete = 0 AND lookup_claimed = 0",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(claimed == 1)
  }

  async fn release_lookup(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE schedule_lookup
              SET lookup_claimed = 0
            WHERE id = ?1 AND lookup_complete = 0",
          rusqlite::params![id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn complete_lookup(
    &self,
    id: i64,
    resolution: LookupResolution,
  ) -> Result<ScheduledLookupEntry> {
    // The `lookup_complete = 0` guard makes completion a one-way transition.
    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE schedule_lookup
             SET lookup_complete    = 1,
                 lookup_status_code = ?2,
                 lookup_flight_id   = ?3,
                 weather_complete   = ?4
           WHERE id = ?1 AND lookup_complete = 0",
          rusqlite::params![
            id,
            resolution.status_code,
            resolution.flight_id,
            resolution.weather_complete,
          ],
        )?)
      })
      .await?;

    match self.get_scheduled_lookup(id).await? {
      None => Err(Error::ScheduledLookupNotFound(id)),
      Some(_) if updated == 0 => Err(Error::AlreadyComplete(id)),
      Some(entry) => Ok(entry),
    }
  }

  // ── Flights ───────────────────────────────────────────────────────────────

  async fn record_flight(&self, details: FlightDetails) -> Result<FlightRecord> {
    let recorded_at = Utc::now();
    let recorded_str = encode_dt(recorded_at);
    let raw = RawFlightInsert::encode(&details);

    let id: i64 = self
      .conn
      .call(move |conn| {
        let mut columns = vec!["recorded_at"];
        columns.extend(flight_insert_columns());
        let sql = format!(
          "INSERT INTO flights ({}) VALUES ({})",
          columns.join(", "),
          placeholders(columns.len()),
        );
        let mut params: Vec<&dyn rusqlite::ToSql> = vec![&recorded_str];
        params.extend(raw.params());
        conn.execute(&sql, params.as_slice())?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(FlightRecord {
      id,
      recorded_at,
      details,
      weather_forecast_id: None,
      weather_forecast_fetched: false,
      weather_forecast_status_code: None,
      weather_forecast_error: None,
    })
  }

  async fn get_flight(&self, id: i64) -> Result<Option<FlightRecord>> {
    let mut flights = self
      .query_flights("WHERE id = ?1", vec![Value::Integer(id)])
      .await?;
    Ok(flights.pop())
  }

  async fn list_flights(&self, user_id: Option<Uuid>) -> Result<Vec<FlightRecord>> {
    match user_id {
      Some(user) => {
        self
          .query_flights("WHERE user_id = ?1", vec![Value::Text(encode_uuid(user))])
          .await
      }
      None => self.query_flights("", vec![]).await,
    }
  }

  async fn update_flight_timeline(
    &self,
    fa_flight_id: String,
    timeline: FlightTimeline,
  ) -> Result<usize> {
    let raw = RawTimeline::encode(&timeline);

    let updated = self
      .conn
      .call(move |conn| {
        let assignments = TIMELINE_COLUMNS
          .iter()
          .enumerate()
          .map(|(i, col)| format!("{col} = ?{}", i + 1))
          .collect::<Vec<_>>()
          .join(", ");
        let sql = format!(
          "UPDATE flights SET {assignments} WHERE fa_flight_id = ?{}",
          TIMELINE_COLUMNS.len() + 1
        );
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::new();
        push_timeline(&mut params, &raw);
        params.push(&fa_flight_id);
        Ok(conn.execute(&sql, params.as_slice())?)
      })
      .await?;

    Ok(updated)
  }

  async fn set_forecast_status(&self, flight_id: i64, status: ForecastStatus) -> Result<()> {
    let (forecast_id, fetched, status_code, error) = match status {
      ForecastStatus::Fetched { forecast_id } => (Some(forecast_id), true, Some(200u16), None),
      ForecastStatus::NotFetched { status_code, error } => (None, false, status_code, Some(error)),
    };

    let updated: usize = self
      .conn
      .call(move |conn| {
        // A failed fetch leaves any previously attached forecast id alone.
        Ok(conn.execute(
          "UPDATE flights
             SET weather_forecast_id          = COALESCE(?2, weather_forecast_id),
                 weather_forecast_fetched     = ?3,
                 weather_forecast_status_code = ?4,
                 weather_forecast_error       = ?5
           WHERE id = ?1",
          rusqlite::params![flight_id, forecast_id, fetched, status_code, error],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::FlightNotFound(flight_id));
    }
    Ok(())
  }

  // ── Forecasts ─────────────────────────────────────────────────────────────

  async fn record_forecast(&self, details: ForecastDetails) -> Result<WeatherForecastRecord> {
    let recorded_at = Utc::now();

    let recorded_str  = encode_dt(recorded_at);
    let departure_str = details.scheduled_departure.map(encode_dt);
    let user_str      = encode_uuid(details.user_id);
    let d             = details.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO forecasts (
             recorded_at, flight_id, fa_flight_id, destination_city,
             forecast_city, coord_lat, coord_lon, country, sunrise, sunset,
             scheduled_departure, weather, user_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            recorded_str,
            d.flight_id,
            d.fa_flight_id,
            d.destination_city,
            d.forecast_city,
            d.coord_lat,
            d.coord_lon,
            d.country,
            d.sunrise,
            d.sunset,
            departure_str,
            d.weather,
            user_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(WeatherForecastRecord { id, recorded_at, details })
  }

  async fn get_forecast(&self, id: i64) -> Result<Option<WeatherForecastRecord>> {
    let raw: Option<RawForecast> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {FORECAST_COLUMNS} FROM forecasts WHERE id = ?1"),
            rusqlite::params![id],
            RawForecast::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawForecast::into_record).transpose()
  }
}
