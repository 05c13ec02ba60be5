//! Lookup requests: decide, then either query the provider now or persist a
//! scheduled entry.

use chrono::{DateTime, NaiveDate, Utc};
use flightwatch_core::{
  decision::{LookupDecision, decide},
  flight::{FlightDetails, FlightRecord},
  provider::{FlightDataProvider, FlightLookup, WeatherProvider},
  schedule::{FlightLookupRequest, NewScheduledLookup, ScheduledLookupEntry},
  store::FlightStore,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  error::{ApiError, Result},
  tracker::Tracker,
};

/// What a lookup request resolved to.
#[derive(Debug)]
pub enum LookupOutcome {
  /// The provider found the flight; the first match was persisted.
  Complete(FlightRecord),
  /// The provider answered with an empty list. Nothing was persisted.
  NoResults { ident: String, date: NaiveDate },
  /// The provider refused the query with a 4xx.
  ProviderRejected {
    ident:  String,
    status: u16,
    detail: String,
  },
  Scheduled(ScheduledLookupEntry),
  /// Too far in the past. Nothing was persisted.
  NotScheduled,
}

impl<S, F, W> Tracker<S, F, W>
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  /// Handle a lookup request for `user_id` as seen at `now`.
  pub async fn lookup(
    &self,
    request: FlightLookupRequest,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<LookupOutcome> {
    let request = request.normalized()?;

    match decide(request.requested_at(), now) {
      LookupDecision::Immediate => {
        self.lookup_now(&request.ident, request.selected_date, user_id).await
      }
      LookupDecision::Scheduled => {
        let entry = self.schedule_normalized(request, user_id).await?;
        Ok(LookupOutcome::Scheduled(entry))
      }
      LookupDecision::Rejected => {
        info!(
          ident = %request.ident,
          date = %request.selected_date,
          "lookup date too far in the past; not scheduling"
        );
        Ok(LookupOutcome::NotScheduled)
      }
    }
  }

  /// Query the flight provider and persist the first match.
  pub async fn lookup_now(
    &self,
    ident: &str,
    date: NaiveDate,
    user_id: Uuid,
  ) -> Result<LookupOutcome> {
    let lookup = self
      .flights
      .flights_by_ident(ident.to_owned(), date)
      .await
      .inspect_err(|e| warn!(%ident, %date, error = %e, "flight provider failed"))?;

    let flights = match lookup {
      FlightLookup::Flights(flights) => flights,
      FlightLookup::Rejected { status, detail } => {
        info!(%ident, %date, status, %detail, "flight provider rejected lookup");
        return Ok(LookupOutcome::ProviderRejected {
          ident: ident.to_owned(),
          status,
          detail,
        });
      }
    };

    let Some(flight) = flights.first() else {
      info!(%ident, %date, "no flights found");
      return Ok(LookupOutcome::NoResults { ident: ident.to_owned(), date });
    };

    let record = self
      .store
      .record_flight(FlightDetails::from_provider(flight, user_id))
      .await
      .map_err(ApiError::store)?;

    info!(
      %ident,
      flight_id = record.id,
      fa_flight_id = %record.details.fa_flight_id,
      "lookup complete"
    );
    Ok(LookupOutcome::Complete(record))
  }

  /// Persist a pending entry for the batch runner. A second entry for the
  /// same ident, date and user is a conflict.
  pub async fn schedule(
    &self,
    request: FlightLookupRequest,
    user_id: Uuid,
  ) -> Result<ScheduledLookupEntry> {
    self.schedule_normalized(request.normalized()?, user_id).await
  }

  /// [`Self::schedule`] for a request that has already been normalized.
  async fn schedule_normalized(
    &self,
    request: FlightLookupRequest,
    user_id: Uuid,
  ) -> Result<ScheduledLookupEntry> {
    let entry = self
      .store
      .schedule_lookup(NewScheduledLookup {
        ident: request.ident,
        flight_date: request.selected_date,
        user_id,
      })
      .await
      .map_err(ApiError::store)?;

    info!(
      entry_id = entry.id,
      ident = %entry.ident,
      date = %entry.flight_date,
      "lookup scheduled"
    );
    Ok(entry)
  }
}
