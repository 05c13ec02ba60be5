//! HTTP surface for Flightwatch.
//!
//! Exposes an axum [`Router`] backed by any [`FlightStore`] and pair of
//! providers. Every route authenticates with HTTP Basic except OPTIONS, and
//! every response carries the CORS headers from [`cors`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/flight-lookup` | Body: `{"ident":"UAL123","selected_date":"2024-06-16"}` |
//! | `GET`  | `/schedule-flight` | Caller's scheduled lookups |
//! | `POST` | `/schedule-flight` | Same body; always schedules. 409 on duplicate |
//! | `GET`  | `/schedule-flight/{id}` | 404 unless owned by the caller |
//! | `POST` | `/schedule-flight/schedule` | Resolve today's pending lookups |
//! | `POST` | `/schedule-flight/refresh` | Refresh every tracked flight |
//! | `GET`  | `/flights` | Caller's flights |
//! | `GET`  | `/flights/{id}` | 404 unless owned by the caller |

pub mod auth;
pub mod batch;
pub mod cors;
pub mod envelope;
pub mod error;
pub mod forecast;
pub mod lookup;
pub mod tracker;

#[cfg(test)]
mod fakes;

pub use error::ApiError;
pub use tracker::Tracker;

use std::{any::Any, path::PathBuf, str::FromStr, sync::Arc};

use axum::{
  Router,
  body::Body,
  extract::{Path, Request, State},
  http::Method,
  middleware,
  response::{IntoResponse, Response},
  routing::any,
};
use chrono::Utc;
use flightwatch_core::{
  provider::{FlightDataProvider, WeatherProvider},
  schedule::{BatchKind, FlightLookupRequest},
  store::FlightStore,
};
use serde::{Deserialize, de::DeserializeOwned};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;
use uuid::Uuid;

use auth::{AuthConfig, Caller, verify_auth};
use envelope::Envelope;

const MAX_BODY_BYTES: usize = 64 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FLIGHTWATCH_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub auth_username:        String,
  pub auth_password_hash:   String,
  pub auth_user_id:         Uuid,
  pub flightaware_key:      String,
  #[serde(default = "default_flightaware_base_url")]
  pub flightaware_base_url: String,
  pub openweather_key:      String,
  #[serde(default = "default_openweather_base_url")]
  pub openweather_base_url: String,
  /// Wait for batch runs to finish before answering.
  #[serde(default)]
  pub join_batches:         bool,
  /// Per-request timeout for provider calls. Unset means none.
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_flightaware_base_url() -> String {
  flightwatch_providers::aeroapi::DEFAULT_BASE_URL.to_owned()
}

fn default_openweather_base_url() -> String {
  flightwatch_providers::openweather::DEFAULT_BASE_URL.to_owned()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, F, W> {
  pub tracker: Tracker<S, F, W>,
  pub auth:    Arc<AuthConfig>,
}

impl<S, F, W> Clone for AppState<S, F, W> {
  fn clone(&self) -> Self {
    Self { tracker: self.tracker.clone(), auth: Arc::clone(&self.auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the Flightwatch API.
pub fn router<S, F, W>(state: AppState<S, F, W>) -> Router
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  Router::new()
    .route("/flight-lookup",            any(flight_lookup_handler::<S, F, W>))
    .route("/schedule-flight",          any(schedule_collection_handler::<S, F, W>))
    .route("/schedule-flight/{suffix}", any(schedule_item_handler::<S, F, W>))
    .route("/flights",                  any(flights_collection_handler::<S, F, W>))
    .route("/flights/{id}",             any(flight_item_handler::<S, F, W>))
    .fallback(fallback_handler)
    .layer(CatchPanicLayer::custom(panic_response))
    .layer(middleware::map_response(cors::apply))
    .with_state(state)
}

// ─── Dispatch helpers ────────────────────────────────────────────────────────

/// `Err(response)` unless the request carries valid credentials.
fn authenticate<S, F, W>(req: &Request<Body>, state: &AppState<S, F, W>) -> Result<Caller, Response> {
  verify_auth(req.headers(), &state.auth).map_err(IntoResponse::into_response)
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, ApiError> {
  let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
    .await
    .map_err(|e| ApiError::BadRequest(format!("could not read request body: {e}")))?;
  serde_json::from_slice(&bytes)
    .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
  raw
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid id {raw:?}")))
}

/// What follows `/schedule-flight/`: a numeric entry id or a batch keyword.
#[derive(Debug, PartialEq, Eq)]
enum ScheduleSuffix {
  Entry(i64),
  Batch(BatchKind),
}

fn parse_schedule_suffix(raw: &str) -> Result<ScheduleSuffix, ApiError> {
  if let Ok(id) = raw.parse::<i64>() {
    return Ok(ScheduleSuffix::Entry(id));
  }
  BatchKind::from_str(raw).map(ScheduleSuffix::Batch).map_err(|_| {
    ApiError::BadRequest(format!(
      "unknown action {raw:?}; expected an entry id, `schedule` or `refresh`"
    ))
  })
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
  let message = if let Some(s) = err.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = err.downcast_ref::<&str>() {
    (*s).to_owned()
  } else {
    "request handler panicked".to_owned()
  };
  error!(%message, "handler panicked");
  ApiError::BadRequest(message).into_response()
}

// ─── Route handlers ──────────────────────────────────────────────────────────

async fn flight_lookup_handler<S, F, W>(
  State(state): State<AppState<S, F, W>>,
  req: Request<Body>,
) -> Response
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let method = req.method().clone();
  if method == Method::OPTIONS { return cors::preflight(); }
  let caller = match authenticate(&req, &state) { Ok(c) => c, Err(r) => return r };
  match method {
    Method::POST => {
      let body: FlightLookupRequest = match read_json(req).await {
        Ok(b)  => b,
        Err(e) => return e.into_response(),
      };
      state.tracker.lookup(body, caller.user_id, Utc::now()).await.into_response()
    }
    _ => ApiError::MethodNotAllowed.into_response(),
  }
}

async fn schedule_collection_handler<S, F, W>(
  State(state): State<AppState<S, F, W>>,
  req: Request<Body>,
) -> Response
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let method = req.method().clone();
  if method == Method::OPTIONS { return cors::preflight(); }
  let caller = match authenticate(&req, &state) { Ok(c) => c, Err(r) => return r };
  match method {
    Method::GET => state
      .tracker
      .store()
      .list_scheduled_lookups(caller.user_id)
      .await
      .map(Envelope::data)
      .map_err(ApiError::store)
      .into_response(),
    Method::POST => {
      let body: FlightLookupRequest = match read_json(req).await {
        Ok(b)  => b,
        Err(e) => return e.into_response(),
      };
      state
        .tracker
        .schedule(body, caller.user_id)
        .await
        .map(lookup::LookupOutcome::Scheduled)
        .into_response()
    }
    _ => ApiError::MethodNotAllowed.into_response(),
  }
}

async fn schedule_item_handler<S, F, W>(
  State(state): State<AppState<S, F, W>>,
  Path(suffix): Path<String>,
  req: Request<Body>,
) -> Response
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let method = req.method().clone();
  if method == Method::OPTIONS { return cors::preflight(); }
  let caller = match authenticate(&req, &state) { Ok(c) => c, Err(r) => return r };
  let suffix = match parse_schedule_suffix(&suffix) { Ok(s) => s, Err(e) => return e.into_response() };
  match (method, suffix) {
    (Method::GET, ScheduleSuffix::Entry(id)) => {
      get_scheduled_entry(&state, caller, id).await.into_response()
    }
    (Method::POST, ScheduleSuffix::Batch(kind)) => state
      .tracker
      .run_batch(kind, Utc::now().date_naive())
      .await
      .into_response(),
    _ => ApiError::MethodNotAllowed.into_response(),
  }
}

async fn get_scheduled_entry<S, F, W>(
  state: &AppState<S, F, W>,
  caller: Caller,
  id: i64,
) -> Result<Envelope<flightwatch_core::schedule::ScheduledLookupEntry>, ApiError>
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let entry = state
    .tracker
    .store()
    .get_scheduled_lookup(id)
    .await
    .map_err(ApiError::store)?
    .filter(|e| e.user_id == caller.user_id)
    .ok_or_else(|| ApiError::NotFound(format!("scheduled lookup {id} not found")))?;
  Ok(Envelope::data(entry))
}

async fn flights_collection_handler<S, F, W>(
  State(state): State<AppState<S, F, W>>,
  req: Request<Body>,
) -> Response
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let method = req.method().clone();
  if method == Method::OPTIONS { return cors::preflight(); }
  let caller = match authenticate(&req, &state) { Ok(c) => c, Err(r) => return r };
  match method {
    Method::GET => state
      .tracker
      .store()
      .list_flights(Some(caller.user_id))
      .await
      .map(Envelope::data)
      .map_err(ApiError::store)
      .into_response(),
    _ => ApiError::MethodNotAllowed.into_response(),
  }
}

async fn flight_item_handler<S, F, W>(
  State(state): State<AppState<S, F, W>>,
  Path(raw_id): Path<String>,
  req: Request<Body>,
) -> Response
where
  S: FlightStore + 'static,
  F: FlightDataProvider + 'static,
  W: WeatherProvider + 'static,
{
  let method = req.method().clone();
  if method == Method::OPTIONS { return cors::preflight(); }
  let caller = match authenticate(&req, &state) { Ok(c) => c, Err(r) => return r };
  if method != Method::GET {
    return ApiError::MethodNotAllowed.into_response();
  }
  let id = match parse_id(&raw_id) { Ok(id) => id, Err(e) => return e.into_response() };
  let flight = state
    .tracker
    .store()
    .get_flight(id)
    .await
    .map_err(ApiError::store)
    .and_then(|found| {
      found
        .filter(|f| f.details.user_id == caller.user_id)
        .ok_or_else(|| ApiError::NotFound(format!("flight {id} not found")))
    });
  flight.map(Envelope::data).into_response()
}

async fn fallback_handler(req: Request<Body>) -> Response {
  if req.method() == Method::OPTIONS {
    cors::preflight()
  } else {
    ApiError::NotFound(format!("no route for {}", req.uri().path())).into_response()
  }
}
