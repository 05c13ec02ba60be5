//! CORS headers and the preflight response.

use axum::{
  http::{HeaderName, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};

/// Headers stamped on every response, errors included.
pub const CORS_HEADERS: [(HeaderName, &str); 4] = [
  (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
  (header::ACCESS_CONTROL_ALLOW_METHODS, "POST"),
  (header::ACCESS_CONTROL_EXPOSE_HEADERS, "Content-Length, X-JSON"),
  (
    header::ACCESS_CONTROL_ALLOW_HEADERS,
    "authorization, x-client-info, apikey, content-type",
  ),
];

/// Response-mapping middleware; see [`axum::middleware::map_response`].
pub async fn apply(mut response: Response) -> Response {
  let headers = response.headers_mut();
  for (name, value) in CORS_HEADERS {
    headers.insert(name, HeaderValue::from_static(value));
  }
  response
}

/// OPTIONS handler. No auth required.
pub fn preflight() -> Response {
  (StatusCode::OK, "ok").into_response()
}
