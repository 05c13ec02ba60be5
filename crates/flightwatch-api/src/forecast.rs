//! Attach a weather forecast for the destination to a stored flight.

use flightwatch_core::{
  flight::{FlightRecord, ForecastStatus},
  forecast::ForecastDetails,
  provider::{FlightDataProvider, WeatherLookup, WeatherProvider},
  schedule::NOT_FOUND_STATUS,
  store::FlightStore,
};
use tracing::{info, warn};

use crate::{
  error::{ApiError, Result},
  tracker::Tracker,
};

impl<S, F, W> Tracker<S, F, W>
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  /// Fetch the destination forecast for `flight` and record the outcome on
  /// the flight row.
  ///
  /// A provider that cannot help is not an error: the flight is marked
  /// not-fetched with the reason. Only store failures are returned.
  pub async fn attach_forecast(&self, flight: &FlightRecord) -> Result<ForecastStatus> {
    let status = match flight.details.destination_city.as_deref() {
      None => ForecastStatus::NotFetched {
        status_code: None,
        error:       "Flight has no destination city to forecast".to_owned(),
      },
      Some(city) => self.fetch_forecast(flight, city).await?,
    };

    self
      .store
      .set_forecast_status(flight.id, status.clone())
      .await
      .map_err(ApiError::store)?;
    Ok(status)
  }

  async fn fetch_forecast(&self, flight: &FlightRecord, city: &str) -> Result<ForecastStatus> {
    let departure = flight
      .scheduled_departure()
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_else(|| "an unknown date".to_owned());

    let lookup = match self.weather.forecast(city.to_owned()).await {
      Ok(lookup) => lookup,
      Err(e) => {
        warn!(flight_id = flight.id, %city, error = %e, "weather provider failed");
        return Ok(ForecastStatus::NotFetched { status_code: None, error: e.to_string() });
      }
    };

    match lookup {
      WeatherLookup::Forecast(response) => {
        let details = ForecastDetails::from_response(flight, city, &response)?;
        let record = self
          .store
          .record_forecast(details)
          .await
          .map_err(ApiError::store)?;
        info!(flight_id = flight.id, forecast_id = record.id, %city, "forecast attached");
        Ok(ForecastStatus::Fetched { forecast_id: record.id })
      }
      WeatherLookup::NotFound => {
        info!(flight_id = flight.id, %city, "no forecast for city");
        Ok(ForecastStatus::NotFetched {
          status_code: Some(NOT_FOUND_STATUS),
          error:       format!("Forecast not available for {city} on {departure}"),
        })
      }
      WeatherLookup::Rejected { status, detail } => {
        warn!(flight_id = flight.id, %city, status, %detail, "weather provider rejected query");
        Ok(ForecastStatus::NotFetched {
          status_code: Some(status),
          error:       format!("Weather API returned {status}: {detail}"),
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use flightwatch_core::{ProviderError, flight::FlightDetails};
  use uuid::Uuid;

  use super::*;
  use crate::fakes::{FakeFlights, FakeWeather, aero_flight, forecast_response, tracker};

  async fn stored_flight(
    t: &Tracker<
      flightwatch_store_sqlite::SqliteStore,
      FakeFlights,
      FakeWeather,
    >,
    city: Option<&str>,
  ) -> FlightRecord {
    let departure = Utc.with_ymd_and_hms(2024, 6, 16, 15, 0, 0).unwrap();
    let flight = aero_flight("UAL123-1", city, departure);
    t.store()
      .record_flight(FlightDetails::from_provider(&flight, Uuid::new_v4()))
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn forecast_is_stored_and_linked() {
    let weather = FakeWeather::default().with_forecast("Newark", forecast_response("Newark"));
    let t = tracker(FakeFlights::default(), weather).await;
    let flight = stored_flight(&t, Some("Newark")).await;

    let status = t.attach_forecast(&flight).await.unwrap();
    let ForecastStatus::Fetched { forecast_id } = status else { panic!("expected fetched") };

    let forecast = t.store().get_forecast(forecast_id).await.unwrap().unwrap();
    assert_eq!(forecast.details.flight_id, flight.id);
    assert_eq!(forecast.details.destination_city, "Newark");
    assert_eq!(forecast.details.country.as_deref(), Some("US"));
    let weather: serde_json::Value =
      serde_json::from_str(forecast.details.weather.as_deref().unwrap()).unwrap();
    assert_eq!(weather["dt_txt"], "2024-06-16 12:00:00");

    let updated = t.store().get_flight(flight.id).await.unwrap().unwrap();
    assert!(updated.weather_forecast_fetched);
    assert_eq!(updated.weather_forecast_id, Some(forecast_id));
    assert_eq!(updated.weather_forecast_status_code, Some(200));
  }

  #[tokio::test]
  async fn forecast_with_no_matching_slot_stores_null_weather() {
    let weather = FakeWeather::default().with_forecast("Newark", forecast_response("Newark"));
    let t = tracker(FakeFlights::default(), weather).await;
    // The forecast only covers 2024-06-15 and 2024-06-16.
    let departure = Utc.with_ymd_and_hms(2024, 6, 20, 9, 30, 0).unwrap();
    let flight = t
      .store()
      .record_flight(FlightDetails::from_provider(
        &aero_flight("UAL123-1", Some("Newark"), departure),
        Uuid::new_v4(),
      ))
      .await
      .unwrap();

    let status = t.attach_forecast(&flight).await.unwrap();
    let ForecastStatus::Fetched { forecast_id } = status else { panic!("expected fetched") };

    let forecast = t.store().get_forecast(forecast_id).await.unwrap().unwrap();
    assert!(forecast.details.weather.is_none());
    assert_eq!(forecast.details.scheduled_departure, Some(departure));

    let updated = t.store().get_flight(flight.id).await.unwrap().unwrap();
    assert!(updated.weather_forecast_fetched);
    assert_eq!(updated.weather_forecast_id, Some(forecast_id));
    assert_eq!(updated.weather_forecast_status_code, Some(200));
  }

  #[tokio::test]
  async fn unknown_city_marks_flight_not_fetched() {
    let t = tracker(FakeFlights::default(), FakeWeather::default()).await;
    let flight = stored_flight(&t, Some("Atlantis")).await;

    let status = t.attach_forecast(&flight).await.unwrap();
    assert!(!status.is_fetched());

    let updated = t.store().get_flight(flight.id).await.unwrap().unwrap();
    assert!(!updated.weather_forecast_fetched);
    assert_eq!(updated.weather_forecast_status_code, Some(404));
    assert_eq!(
      updated.weather_forecast_error.as_deref(),
      Some("Forecast not available for Atlantis on 2024-06-16")
    );
  }

  #[tokio::test]
  async fn rejection_records_status_and_detail() {
    let weather = FakeWeather::default().with_rejection("Newark", 401, "Invalid API key");
    let t = tracker(FakeFlights::default(), weather).await;
    let flight = stored_flight(&t, Some("Newark")).await;

    t.attach_forecast(&flight).await.unwrap();
    let updated = t.store().get_flight(flight.id).await.unwrap().unwrap();
    assert_eq!(updated.weather_forecast_status_code, Some(401));
    assert_eq!(
      updated.weather_forecast_error.as_deref(),
      Some("Weather API returned 401: Invalid API key")
    );
  }

  #[tokio::test]
  async fn transport_failure_records_no_status() {
    let weather = FakeWeather::default().with_error("Newark", ProviderError::Transport {
      provider: "OpenWeather",
      message:  "connection reset".into(),
    });
    let t = tracker(FakeFlights::default(), weather).await;
    let flight = stored_flight(&t, Some("Newark")).await;

    t.attach_forecast(&flight).await.unwrap();
    let updated = t.store().get_flight(flight.id).await.unwrap().unwrap();
    assert!(!updated.weather_forecast_fetched);
    assert!(updated.weather_forecast_status_code.is_none());
    assert!(updated.weather_forecast_error.unwrap().contains("connection reset"));
  }

  #[tokio::test]
  async fn missing_destination_is_not_fetched() {
    let t = tracker(FakeFlights::default(), FakeWeather::default()).await;
    let flight = stored_flight(&t, None).await;

    let status = t.attach_forecast(&flight).await.unwrap();
    assert!(matches!(status, ForecastStatus::NotFetched { status_code: None, .. }));
    assert_eq!(t.weather.calls(), 0);
  }
}
