//! Error type for `flightwatch-providers`.
//!
//! Only client construction fails with this type. Failures during a request
//! are reported as [`flightwatch_core::ProviderError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("invalid base URL {url:?}: {reason}")]
  BaseUrl { url: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
