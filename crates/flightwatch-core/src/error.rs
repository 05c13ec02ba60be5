//! Error types for `flightwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("flight identifier must not be empty")]
  EmptyIdent,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure talking to a third-party provider that the caller cannot
/// recover from locally: a 5xx, a transport failure, or a body that does not
/// match the provider's contract.
///
/// Provider 4xx responses are *not* errors; they are modelled as the
/// `Rejected` variants of [`crate::provider::FlightLookup`] and
/// [`crate::provider::WeatherLookup`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
  #[error("{provider} returned {status}: {detail}")]
  Upstream {
    provider: &'static str,
    status:   u16,
    detail:   String,
  },

  #[error("{provider} request failed: {message}")]
  Transport {
    provider: &'static str,
    message:  String,
  },

  #[error("{provider} response could not be decoded: {message}")]
  Decode {
    provider: &'static str,
    message:  String,
  },
}
