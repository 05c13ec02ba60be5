//! Plumbing shared by both provider clients.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::{Error, Result};

/// Build a client. Without `timeout` only reqwest's connection defaults
/// apply.
pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client> {
  let mut builder = Client::builder().user_agent(concat!(
    "flightwatch/",
    env!("CARGO_PKG_VERSION")
  ));
  if let Some(timeout) = timeout {
    builder = builder.timeout(timeout);
  }
  Ok(builder.build()?)
}

/// Parse a base URL once so later path joins cannot fail.
pub(crate) fn parse_base(base_url: &str) -> Result<Url> {
  let url = Url::parse(base_url).map_err(|e| Error::BaseUrl {
    url:    base_url.to_owned(),
    reason: e.to_string(),
  })?;
  if url.cannot_be_a_base() {
    return Err(Error::BaseUrl {
      url:    base_url.to_owned(),
      reason: "not a hierarchical URL".to_owned(),
    });
  }
  Ok(url)
}

/// Append `segments` to `base`, percent-encoding each one.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Url {
  let mut url = base.clone();
  if let Ok(mut path) = url.path_segments_mut() {
    path.pop_if_empty().extend(segments);
  }
  url
}

/// A short human-readable reason from an error body.
///
/// Both providers answer errors with JSON; AeroAPI puts the reason in
/// `detail` (or `reason`), OpenWeather in `message`. Anything else is
/// returned as-is.
pub(crate) fn error_detail(body: &str) -> String {
  let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
  parsed
    .as_ref()
    .and_then(|v| {
      ["detail", "reason", "message", "title"]
        .iter()
        .find_map(|key| v.get(key).and_then(|m| m.as_str()))
    })
    .map(str::to_owned)
    .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_encodes_segments() {
    let base = parse_base("https://example.test/aeroapi").unwrap();
    assert_eq!(
      join(&base, &["flights", "UAL 1/2"]).as_str(),
      "https://example.test/aeroapi/flights/UAL%201%2F2"
    );
  }

  #[test]
  fn join_tolerates_trailing_slash() {
    let base = parse_base("https://example.test/aeroapi/").unwrap();
    assert_eq!(
      join(&base, &["flights", "UAL123"]).as_str(),
      "https://example.test/aeroapi/flights/UAL123"
    );
  }

  #[test]
  fn rejects_non_base_url() {
    assert!(matches!(parse_base("mailto:ops@example.test"), Err(Error::BaseUrl { .. })));
    assert!(matches!(parse_base("not a url"), Err(Error::BaseUrl { .. })));
  }

  #[test]
  fn error_detail_prefers_known_keys() {
    assert_eq!(
      error_detail(r#"{"title":"Bad Request","detail":"Invalid ident"}"#),
      "Invalid ident"
    );
    assert_eq!(error_detail(r#"{"cod":"404","message":"city not found"}"#), "city not found");
    assert_eq!(error_detail("  upstream exploded \n"), "upstream exploded");
  }
}
