//! Async HTTP client wrapping the Flightwatch JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use flightwatch_core::schedule::{BatchKind, FlightLookupRequest};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

/// Connection settings for the Flightwatch API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Flightwatch API.
///
/// Every call returns the response envelope as raw JSON.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    // Batch runs in join mode can take a while.
    let client = Client::builder()
      .timeout(Duration::from_secs(300))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn send(&self, method: Method, path: &str, body: Option<&FlightLookupRequest>) -> Result<Value> {
    debug!(%method, %path, "calling Flightwatch API");
    let mut req = self.auth(self.client.request(method.clone(), self.url(path)));
    if let Some(body) = body {
      req = req.json(body);
    }

    let resp = req
      .send()
      .await
      .with_context(|| format!("{method} {path} failed"))?;

    let status = resp.status();
    let value: Value = resp
      .json()
      .await
      .with_context(|| format!("deserialising {method} {path} response"))?;

    if !status.is_success() {
      let message = value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| value.to_string());
      return Err(anyhow!("{method} {path} → {status}: {message}"));
    }
    Ok(value)
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  /// `POST /flight-lookup`
  pub async fn lookup(&self, ident: &str, date: NaiveDate) -> Result<Value> {
    let body = FlightLookupRequest { ident: ident.to_owned(), selected_date: date };
    self.send(Method::POST, "/flight-lookup", Some(&body)).await
  }

  /// `POST /schedule-flight`
  pub async fn schedule(&self, ident: &str, date: NaiveDate) -> Result<Value> {
    let body = FlightLookupRequest { ident: ident.to_owned(), selected_date: date };
    self.send(Method::POST, "/schedule-flight", Some(&body)).await
  }

  /// `GET /schedule-flight`
  pub async fn pending(&self) -> Result<Value> {
    self.send(Method::GET, "/schedule-flight", None).await
  }

  // ── Batch ─────────────────────────────────────────────────────────────────

  /// `POST /schedule-flight/{schedule|refresh}`
  pub async fn run(&self, kind: BatchKind) -> Result<Value> {
    self.send(Method::POST, &format!("/schedule-flight/{kind}"), None).await
  }

  // ── Flights ───────────────────────────────────────────────────────────────

  /// `GET /flights` or `GET /flights/{id}`
  pub async fn flights(&self, id: Option<i64>) -> Result<Value> {
    let path = match id {
      Some(id) => format!("/flights/{id}"),
      None => "/flights".to_owned(),
    };
    self.send(Method::GET, &path, None).await
  }
}
