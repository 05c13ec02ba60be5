//! FlightAware AeroAPI client.
//!
//! | Query | Request |
//! |-------|---------|
//! | by ident and date | `GET {base}/flights/{ident}?start=YYYY-MM-DD` |
//! | by provider id    | `GET {base}/flights/{fa_flight_id}` |
//!
//! Both answer `{"flights":[…]}` and authenticate with the `x-apikey`
//! header.

use std::time::Duration;

use chrono::NaiveDate;
use flightwatch_core::{
  ProviderError,
  provider::{AeroFlightsResponse, FlightDataProvider, FlightLookup},
};
use reqwest::{Client, Url};
use tracing::debug;

use crate::{
  Result,
  http::{build_client, error_detail, join, parse_base},
};

pub const DEFAULT_BASE_URL: &str = "https://aeroapi.flightaware.com/aeroapi";

const PROVIDER: &str = "AeroAPI";

/// Async client for AeroAPI.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct AeroApiClient {
  client:   Client,
  base_url: Url,
  api_key:  String,
}

impl AeroApiClient {
  pub fn new(
    base_url: &str,
    api_key: impl Into<String>,
    timeout: Option<Duration>,
  ) -> Result<Self> {
    Ok(Self {
      client:   build_client(timeout)?,
      base_url: parse_base(base_url)?,
      api_key:  api_key.into(),
    })
  }

  async fn fetch(
    &self,
    url: Url,
    query: &[(&str, String)],
  ) -> Result<FlightLookup, ProviderError> {
    debug!(%url, "querying AeroAPI");

    let resp = self
      .client
      .get(url)
      .header("x-apikey", &self.api_key)
      .query(query)
      .send()
      .await
      .map_err(|e| ProviderError::Transport {
        provider: PROVIDER,
        message:  e.to_string(),
      })?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      let detail = error_detail(&body);
      if status.is_client_error() {
        return Ok(FlightLookup::Rejected { status: status.as_u16(), detail });
      }
      return Err(ProviderError::Upstream {
        provider: PROVIDER,
        status: status.as_u16(),
        detail,
      });
    }

    let body: AeroFlightsResponse =
      resp.json().await.map_err(|e| ProviderError::Decode {
        provider: PROVIDER,
        message:  e.to_string(),
      })?;
    Ok(FlightLookup::Flights(body.flights))
  }
}

impl FlightDataProvider for AeroApiClient {
  async fn flights_by_ident(
    &self,
    ident: String,
    date: NaiveDate,
  ) -> Result<FlightLookup, ProviderError> {
    let url = join(&self.base_url, &["flights", &ident]);
    self
      .fetch(url, &[("start", date.format("%Y-%m-%d").to_string())])
      .await
  }

  async fn flight_by_id(&self, fa_flight_id: String) -> Result<FlightLookup, ProviderError> {
    let url = join(&self.base_url, &["flights", &fa_flight_id]);
    self.fetch(url, &[]).await
  }
}
