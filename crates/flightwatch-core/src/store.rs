//! The `FlightStore` trait: the persistence boundary.
//!
//! The trait is implemented by storage backends (e.g.
//! `flightwatch-store-sqlite`). Higher layers depend on this abstraction, not
//! on any concrete backend. It holds no logic; every method is a single
//! insert, update or select against one of the three collections.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  flight::{FlightDetails, FlightRecord, FlightTimeline, ForecastStatus},
  forecast::{ForecastDetails, WeatherForecastRecord},
  schedule::{LookupResolution, NewScheduledLookup, ScheduledLookupEntry},
};

/// Classification hook for backend errors.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the write collided with an existing row (a unique-key
  /// violation).
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a Flightwatch store backend.
///
/// All methods return `Send` futures so the trait can be used from tasks
/// spawned on a multi-threaded runtime.
pub trait FlightStore: Send + Sync {
  type Error: StoreError;

  // ── Scheduled lookups ─────────────────────────────────────────────────

  /// Persist a new pending entry. A second entry for the same ident, date
  /// and user is a conflict.
  fn schedule_lookup(
    &self,
    input: NewScheduledLookup,
  ) -> impl Future<Output = Result<ScheduledLookupEntry, Self::Error>> + Send + '_;

  fn get_scheduled_lookup(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ScheduledLookupEntry>, Self::Error>>
  + Send
  + '_;

  /// All entries owned by `user_id`, oldest first.
  fn list_scheduled_lookups(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ScheduledLookupEntry>, Self::Error>> + Send + '_;

  /// Entries for `flight_date` whose lookup is not yet complete.
  fn pending_lookups(
    &self,
    flight_date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ScheduledLookupEntry>, Self::Error>> + Send + '_;

  /// Take a pending entry for one batch task. Returns `false` when the
  /// entry is missing, already complete or already claimed; at most one
  /// caller wins.
  fn claim_lookup(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Hand a claimed entry back so a later run can pick it up. Completed
  /// entries are left alone.
  fn release_lookup(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Mark an entry complete. Fails if the entry does not exist or is
  /// already complete; completion happens exactly once.
  fn complete_lookup(
    &self,
    id: i64,
    resolution: LookupResolution,
  ) -> impl Future<Output = Result<ScheduledLookupEntry, Self::Error>> + Send + '_;

  // ── Flights ───────────────────────────────────────────────────────────

  /// Insert a new flight row. Every successful lookup adds a row; history
  /// accumulates.
  fn record_flight(
    &self,
    details: FlightDetails,
  ) -> impl Future<Output = Result<FlightRecord, Self::Error>> + Send + '_;

  fn get_flight(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<FlightRecord>, Self::Error>> + Send + '_;

  /// All flights, or only those owned by `user_id`.
  fn list_flights(
    &self,
    user_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<FlightRecord>, Self::Error>> + Send + '_;

  /// Overwrite the timeline of every row with `fa_flight_id`; returns the
  /// number of rows updated.
  fn update_flight_timeline(
    &self,
    fa_flight_id: String,
    timeline: FlightTimeline,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Record the outcome of a forecast fetch on a flight row.
  fn set_forecast_status(
    &self,
    flight_id: i64,
    status: ForecastStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Forecasts ─────────────────────────────────────────────────────────

  fn record_forecast(
    &self,
    details: ForecastDetails,
  ) -> impl Future<Output = Result<WeatherForecastRecord, Self::Error>> + Send + '_;

  fn get_forecast(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<WeatherForecastRecord>, Self::Error>>
  + Send
  + '_;
}
