//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use flightwatch_core::{ProviderError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by a handler or by the tracker.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("method not allowed")]
  MethodNotAllowed,

  #[error(transparent)]
  Core(#[from] flightwatch_core::Error),

  #[error("upstream error: {0}")]
  Upstream(#[from] ProviderError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error, turning unique-key collisions into
  /// [`ApiError::Conflict`].
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      ApiError::Conflict(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      // Auth failures are reported as plain bad requests.
      ApiError::Unauthorized | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
      ApiError::Core(flightwatch_core::Error::EmptyIdent) => StatusCode::BAD_REQUEST,
      ApiError::Core(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      other => other.to_string(),
    };
    (self.status(), Json(json!({ "error": message }))).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("{0}")]
  struct FakeStoreError(&'static str, bool);

  impl StoreError for FakeStoreError {
    fn is_conflict(&self) -> bool { self.1 }
  }

  #[test]
  fn conflicts_map_to_409() {
    let err = ApiError::store(FakeStoreError("duplicate", true));
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.status(), StatusCode::CONFLICT);
  }

  #[test]
  fn other_store_errors_map_to_500() {
    let err = ApiError::store(FakeStoreError("disk full", false));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn statuses() {
    assert_eq!(ApiError::Unauthorized.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      ApiError::Core(flightwatch_core::Error::EmptyIdent).status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      ApiError::Upstream(ProviderError::Transport {
        provider: "AeroAPI",
        message:  "connection refused".into(),
      })
      .status(),
      StatusCode::BAD_GATEWAY
    );
  }

  #[tokio::test]
  async fn body_is_error_json() {
    let resp = ApiError::NotFound("flight 7 not found".into()).into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "flight 7 not found" }));
  }
}
