//! The scheduled-batch runner.
//!
//! A run is triggered externally (typically by cron through the CLI). Each
//! pending entry, or each distinct tracked flight for a refresh, gets its own
//! task in a [`JoinSet`]; there is no parallelism bound and no retry beyond
//! the next invocation.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use flightwatch_core::{
  flight::{FlightDetails, FlightTimeline},
  provider::{FlightDataProvider, FlightLookup, WeatherProvider},
  schedule::{BatchKind, LookupResolution, ScheduledLookupEntry},
  store::FlightStore,
};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::{
  error::{ApiError, Result},
  tracker::Tracker,
};

/// Whether a batch run waits for its tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainMode {
  /// Return once every task is spawned; the tasks keep running.
  #[default]
  Detached,
  /// Wait for every task and report its outcome.
  Join,
}

impl DrainMode {
  pub fn from_join_flag(join: bool) -> Self {
    if join { DrainMode::Join } else { DrainMode::Detached }
  }
}

/// What one batch task did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
  /// The flight was found and stored; the entry is complete.
  Found {
    entry_id:        i64,
    flight_id:       i64,
    weather_fetched: bool,
  },
  /// The provider rejected the query or found nothing; the entry is
  /// complete with a 404.
  NotFound { entry_id: i64 },
  /// The entry was already complete, or held by another run, when the task
  /// tried to claim it.
  Skipped { entry_id: i64 },
  /// The provider failed; the entry stays pending for the next run.
  Pending { entry_id: i64, error: String },
  /// Every stored row for the flight got the latest timeline.
  Refreshed { fa_flight_id: String, rows: usize },
  /// The provider had nothing usable for the flight; rows are untouched.
  Unchanged { fa_flight_id: String, reason: String },
  /// A store write failed part way through.
  Failed { target: String, error: String },
}

/// Result of [`Tracker::run_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
  pub kind:     BatchKind,
  pub spawned:  usize,
  /// Per-task outcomes, in completion order. `None` when the run was
  /// detached.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcomes: Option<Vec<EntryOutcome>>,
}

impl<S, F, W> Tracker<S, F, W>
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  /// Fan out over `today`'s pending entries, or over every tracked flight
  /// for a refresh.
  pub async fn run_batch(&self, kind: BatchKind, today: NaiveDate) -> Result<BatchReport> {
    let mut tasks = JoinSet::new();

    match kind {
      BatchKind::Schedule => {
        let pending = self
          .store
          .pending_lookups(today)
          .await
          .map_err(ApiError::store)?;
        for entry in pending {
          let tracker = self.clone();
          tasks.spawn(async move { tracker.resolve_entry(entry).await });
        }
      }
      BatchKind::Refresh => {
        let flights = self.store.list_flights(None).await.map_err(ApiError::store)?;
        let ids: BTreeSet<String> =
          flights.into_iter().map(|f| f.details.fa_flight_id).collect();
        for fa_flight_id in ids {
          let tracker = self.clone();
          tasks.spawn(async move { tracker.refresh_flight(fa_flight_id).await });
        }
      }
    }

    let spawned = tasks.len();
    info!(%kind, %today, spawned, drain = ?self.drain, "batch started");

    let outcomes = match self.drain {
      DrainMode::Detached => {
        tasks.detach_all();
        None
      }
      DrainMode::Join => {
        let mut outcomes = Vec::with_capacity(spawned);
        while let Some(joined) = tasks.join_next().await {
          match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!(%kind, error = %e, "batch task did not finish"),
          }
        }
        info!(%kind, finished = outcomes.len(), "batch finished");
        Some(outcomes)
      }
    };

    Ok(BatchReport { kind, spawned, outcomes })
  }

  // ── Schedule ──────────────────────────────────────────────────────────────

  async fn resolve_entry(&self, entry: ScheduledLookupEntry) -> EntryOutcome {
    let entry_id = entry.id;

    // The claim is the only gate: the entry may have been completed since
    // the pending list was read, or an overlapping run may hold it.
    match self.store.claim_lookup(entry_id).await {
      Ok(true) => {}
      Ok(false) => {
        info!(entry_id, "scheduled lookup complete or claimed elsewhere; skipping");
        return EntryOutcome::Skipped { entry_id };
      }
      Err(e) => {
        let e = ApiError::store(e);
        error!(entry_id, error = %e, "could not claim scheduled lookup");
        return EntryOutcome::Failed { target: entry_id.to_string(), error: e.to_string() };
      }
    }

    let outcome = match self.try_resolve_entry(entry).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(entry_id, error = %e, "scheduled lookup failed");
        EntryOutcome::Failed { target: entry_id.to_string(), error: e.to_string() }
      }
    };

    // Anything short of completion goes back to the pending pool.
    if matches!(outcome, EntryOutcome::Pending { .. } | EntryOutcome::Failed { .. })
      && let Err(e) = self.store.release_lookup(entry_id).await
    {
      error!(entry_id, error = %e, "could not release scheduled lookup");
    }
    outcome
  }

  /// Resolve an entry this task has claimed.
  async fn try_resolve_entry(&self, current: ScheduledLookupEntry) -> Result<EntryOutcome> {
    let entry_id = current.id;

    let lookup = match self
      .flights
      .flights_by_ident(current.ident.clone(), current.flight_date)
      .await
    {
      Ok(lookup) => lookup,
      Err(e) => {
        warn!(entry_id, ident = %current.ident, error = %e, "flight provider failed; leaving pending");
        return Ok(EntryOutcome::Pending { entry_id, error: e.to_string() });
      }
    };

    let flight = match lookup {
      FlightLookup::Flights(flights) => flights.into_iter().next(),
      FlightLookup::Rejected { status, detail } => {
        info!(entry_id, ident = %current.ident, status, %detail, "flight provider rejected lookup");
        None
      }
    };

    let Some(flight) = flight else {
      self
        .store
        .complete_lookup(entry_id, LookupResolution::not_found())
        .await
        .map_err(ApiError::store)?;
      info!(entry_id, ident = %current.ident, "scheduled lookup found nothing");
      return Ok(EntryOutcome::NotFound { entry_id });
    };

    let record = self
      .store
      .record_flight(FlightDetails::from_provider(&flight, current.user_id))
      .await
      .map_err(ApiError::store)?;
    let forecast = self.attach_forecast(&record).await?;

    self
      .store
      .complete_lookup(entry_id, LookupResolution::found(record.id, forecast.is_fetched()))
      .await
      .map_err(ApiError::store)?;

    info!(
      entry_id,
      flight_id = record.id,
      weather_fetched = forecast.is_fetched(),
      "scheduled lookup complete"
    );
    Ok(EntryOutcome::Found {
      entry_id,
      flight_id: record.id,
      weather_fetched: forecast.is_fetched(),
    })
  }

  // ── Refresh ───────────────────────────────────────────────────────────────

  async fn refresh_flight(&self, fa_flight_id: String) -> EntryOutcome {
    match self.try_refresh_flight(fa_flight_id.clone()).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(%fa_flight_id, error = %e, "flight refresh failed");
        EntryOutcome::Failed { target: fa_flight_id, error: e.to_string() }
      }
    }
  }

  async fn try_refresh_flight(&self, fa_flight_id: String) -> Result<EntryOutcome> {
    let unchanged = |reason: String| -> Result<EntryOutcome> {
      warn!(%fa_flight_id, %reason, "flight not refreshed");
      Ok(EntryOutcome::Unchanged { fa_flight_id: fa_flight_id.clone(), reason })
    };

    let flights = match self.flights.flight_by_id(fa_flight_id.clone()).await {
      Ok(FlightLookup::Flights(flights)) => flights,
      Ok(FlightLookup::Rejected { status, detail }) => {
        return unchanged(format!("provider rejected query ({status}): {detail}"));
      }
      Err(e) => return unchanged(e.to_string()),
    };
    let Some(latest) = flights.first() else {
      return unchanged("provider returned no flights".to_owned());
    };

    let rows = self
      .store
      .update_flight_timeline(fa_flight_id.clone(), FlightTimeline::from(latest))
      .await
      .map_err(ApiError::store)?;

    info!(%fa_flight_id, rows, status = ?latest.status, "flight refreshed");
    Ok(EntryOutcome::Refreshed { fa_flight_id, rows })
  }
}
