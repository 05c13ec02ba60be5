//! In-process provider fakes and fixtures shared by the crate's tests.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, NaiveDate, Utc};
use flightwatch_core::{
  ProviderError,
  provider::{
    AeroFlight, FlightDataProvider, FlightLookup, ForecastResponse, WeatherLookup,
    WeatherProvider,
  },
};
use flightwatch_store_sqlite::SqliteStore;
use serde_json::json;

use crate::{batch::DrainMode, tracker::Tracker};

enum Reply<T> {
  Ok(T),
  Err(ProviderError),
  Panic,
}

impl<T: Clone> Reply<T> {
  fn get(&self) -> Result<T, ProviderError> {
    match self {
      Reply::Ok(v) => Ok(v.clone()),
      Reply::Err(e) => Err(e.clone()),
      Reply::Panic => panic!("provider fake told to panic"),
    }
  }
}

// ─── Flights ─────────────────────────────────────────────────────────────────

/// Unknown idents and ids answer with an empty flight list.
#[derive(Default)]
pub struct FakeFlights {
  by_ident: Mutex<HashMap<String, Reply<FlightLookup>>>,
  by_id:    Mutex<HashMap<String, Reply<FlightLookup>>>,
  calls:    AtomicUsize,
}

impl FakeFlights {
  pub fn with_flights(self, ident: &str, flights: Vec<AeroFlight>) -> Self {
    self.set_ident(ident, Reply::Ok(FlightLookup::Flights(flights)))
  }

  pub fn with_rejection(self, ident: &str, status: u16, detail: &str) -> Self {
    self.set_ident(
      ident,
      Reply::Ok(FlightLookup::Rejected { status, detail: detail.into() }),
    )
  }

  pub fn with_error(self, ident: &str, error: ProviderError) -> Self {
    self.set_ident(ident, Reply::Err(error))
  }

  pub fn with_panic(self, ident: &str) -> Self { self.set_ident(ident, Reply::Panic) }

  pub fn with_id(self, fa_flight_id: &str, flights: Vec<AeroFlight>) -> Self {
    self
      .by_id
      .lock()
      .unwrap()
      .insert(fa_flight_id.into(), Reply::Ok(FlightLookup::Flights(flights)));
    self
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn set_ident(self, ident: &str, reply: Reply<FlightLookup>) -> Self {
    self.by_ident.lock().unwrap().insert(ident.into(), reply);
    self
  }

  fn answer(
    &self,
    table: &Mutex<HashMap<String, Reply<FlightLookup>>>,
    key: &str,
  ) -> Result<FlightLookup, ProviderError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let reply = table.lock().unwrap().get(key).map(Reply::get);
    reply.unwrap_or_else(|| Ok(FlightLookup::Flights(vec![])))
  }
}

impl FlightDataProvider for FakeFlights {
  async fn flights_by_ident(
    &self,
    ident: String,
    _date: NaiveDate,
  ) -> Result<FlightLookup, ProviderError> {
    self.answer(&self.by_ident, &ident)
  }

  async fn flight_by_id(&self, fa_flight_id: String) -> Result<FlightLookup, ProviderError> {
    self.answer(&self.by_id, &fa_flight_id)
  }
}

// ─── Weather ─────────────────────────────────────────────────────────────────

/// Unknown cities answer [`WeatherLookup::NotFound`].
#[derive(Default)]
pub struct FakeWeather {
  by_city: Mutex<HashMap<String, Reply<WeatherLookup>>>,
  calls:   AtomicUsize,
}

impl FakeWeather {
  pub fn with_forecast(self, city: &str, response: ForecastResponse) -> Self {
    self.set(city, Reply::Ok(WeatherLookup::Forecast(response)))
  }

  pub fn with_rejection(self, city: &str, status: u16, detail: &str) -> Self {
    self.set(city, Reply::Ok(WeatherLookup::Rejected { status, detail: detail.into() }))
  }

  pub fn with_error(self, city: &str, error: ProviderError) -> Self {
    self.set(city, Reply::Err(error))
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn set(self, city: &str, reply: Reply<WeatherLookup>) -> Self {
    self.by_city.lock().unwrap().insert(city.into(), reply);
    self
  }
}

impl WeatherProvider for FakeWeather {
  async fn forecast(&self, city: String) -> Result<WeatherLookup, ProviderError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let reply = self.by_city.lock().unwrap().get(&city).map(Reply::get);
    reply.unwrap_or(Ok(WeatherLookup::NotFound))
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A tracker over a fresh in-memory store that joins its batch runs.
pub async fn tracker(
  flights: FakeFlights,
  weather: FakeWeather,
) -> Tracker<SqliteStore, FakeFlights, FakeWeather> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  Tracker::new(Arc::new(store), Arc::new(flights), Arc::new(weather), DrainMode::Join)
}

pub fn aero_flight(
  fa_flight_id: &str,
  destination_city: Option<&str>,
  scheduled_out: DateTime<Utc>,
) -> AeroFlight {
  let ident = fa_flight_id.split('-').next().unwrap_or(fa_flight_id);
  serde_json::from_value(json!({
    "ident": ident,
    "fa_flight_id": fa_flight_id,
    "operator": "UAL",
    "status": "Scheduled",
    "origin": { "code": "KSFO", "code_iata": "SFO", "city": "San Francisco" },
    "destination": destination_city.map(|city| json!({ "code": "KEWR", "city": city })),
    "scheduled_out": scheduled_out,
  }))
  .unwrap()
}

/// A forecast whose list covers 2024-06-15 and 2024-06-16.
pub fn forecast_response(city: &str) -> ForecastResponse {
  serde_json::from_value(json!({
    "list": [
      { "dt": 1718452800, "dt_txt": "2024-06-15 12:00:00", "main": { "temp": 21.0 } },
      { "dt": 1718539200, "dt_txt": "2024-06-16 12:00:00", "main": { "temp": 24.5 } },
      { "dt": 1718550000, "dt_txt": "2024-06-16 15:00:00", "main": { "temp": 25.1 } }
    ],
    "city": {
      "name": city,
      "coord": { "lat": 40.7357, "lon": -74.1724 },
      "country": "US",
      "sunrise": 1718443800,
      "sunset": 1718498400,
      "timezone": -14400
    }
  }))
  .unwrap()
}
