//! The JSON envelope every successful response is wrapped in.
//!
//! Lookups answer `{results, isScheduled, lookupComplete, lookupStatus}`;
//! reads answer `{data}`; errors are `{error}` (see [`crate::ApiError`]).

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
  batch::BatchReport,
  lookup::LookupOutcome,
};

pub const STATUS_COMPLETE: &str = "Complete";
pub const STATUS_SCHEDULED: &str = "Scheduled";
pub const STATUS_NOT_SCHEDULED: &str = "Not Scheduled";
pub const STATUS_IN_PROGRESS: &str = "In Progress";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub results:         Option<Vec<T>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:            Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_scheduled:    Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lookup_complete: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lookup_status:   Option<String>,
}

impl<T> Envelope<T> {
  pub fn data(data: T) -> Self {
    Self {
      results:         None,
      data:            Some(data),
      is_scheduled:    None,
      lookup_complete: None,
      lookup_status:   None,
    }
  }

  pub fn lookup(
    results: Vec<T>,
    is_scheduled: bool,
    lookup_complete: bool,
    status: impl Into<String>,
  ) -> Self {
    Self {
      results:         Some(results),
      data:            None,
      is_scheduled:    Some(is_scheduled),
      lookup_complete: Some(lookup_complete),
      lookup_status:   Some(status.into()),
    }
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.lookup_status = Some(status.into());
    self
  }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
  fn into_response(self) -> Response { (StatusCode::OK, Json(self)).into_response() }
}

/// Placeholder result for a request that produced no record.
#[derive(Debug, Serialize)]
struct Notice {
  msg: &'static str,
}

impl IntoResponse for LookupOutcome {
  fn into_response(self) -> Response {
    match self {
      LookupOutcome::Complete(record) => {
        Envelope::lookup(vec![record], false, true, STATUS_COMPLETE).into_response()
      }
      LookupOutcome::NoResults { ident, date } => Envelope::<Notice>::lookup(
        vec![],
        false,
        true,
        format!("No results found for {ident} on {date}"),
      )
      .into_response(),
      LookupOutcome::ProviderRejected { ident, status, detail } => Envelope::<Notice>::lookup(
        vec![],
        false,
        false,
        format!(
          "Flight lookup for {ident} was rejected ({status}: {detail}); check your flight number and date"
        ),
      )
      .into_response(),
      LookupOutcome::Scheduled(entry) => {
        Envelope::lookup(vec![entry], true, false, STATUS_SCHEDULED).into_response()
      }
      LookupOutcome::NotScheduled => Envelope::lookup(
        vec![Notice { msg: "not scheduled" }],
        false,
        false,
        STATUS_NOT_SCHEDULED,
      )
      .into_response(),
    }
  }
}

impl IntoResponse for BatchReport {
  fn into_response(self) -> Response {
    // A detached run has only spawned its tasks.
    let status = if self.outcomes.is_some() { STATUS_COMPLETE } else { STATUS_IN_PROGRESS };
    Envelope::data(self).with_status(status).into_response()
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use flightwatch_core::schedule::BatchKind;
  use serde_json::{Value, json};

  use super::*;

  async fn body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn not_scheduled_envelope() {
    let v = body(LookupOutcome::NotScheduled.into_response()).await;
    assert_eq!(
      v,
      json!({
        "results": [{ "msg": "not scheduled" }],
        "isScheduled": false,
        "lookupComplete": false,
        "lookupStatus": "Not Scheduled"
      })
    );
  }

  #[tokio::test]
  async fn no_results_envelope_names_flight() {
    let outcome = LookupOutcome::NoResults {
      ident: "UAL123".into(),
      date:  NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
    };
    let v = body(outcome.into_response()).await;
    assert_eq!(v["results"], json!([]));
    assert_eq!(v["lookupStatus"], "No results found for UAL123 on 2024-06-16");
  }

  #[tokio::test]
  async fn rejected_envelope_is_a_success_with_guidance() {
    let outcome = LookupOutcome::ProviderRejected {
      ident:  "XX".into(),
      status: 400,
      detail: "Invalid ident".into(),
    };
    let resp = outcome.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body(resp).await;
    assert_eq!(v["lookupComplete"], false);
    assert!(v["lookupStatus"].as_str().unwrap().contains("check your flight number"));
  }

  #[tokio::test]
  async fn data_envelope_omits_lookup_fields() {
    let v = body(Envelope::data(vec![1, 2]).into_response()).await;
    assert_eq!(v, json!({ "data": [1, 2] }));
  }

  #[tokio::test]
  async fn detached_batch_reports_in_progress() {
    let report = BatchReport { kind: BatchKind::Schedule, spawned: 3, outcomes: None };
    let v = body(report.into_response()).await;
    assert_eq!(v["lookupStatus"], "In Progress");
    assert_eq!(v["data"], json!({ "kind": "schedule", "spawned": 3 }));
  }
}
