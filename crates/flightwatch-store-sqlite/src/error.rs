//! Error type for `flightwatch-store-sqlite`.

use flightwatch_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] flightwatch_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A unique constraint rejected the write.
  #[error("duplicate record: {0}")]
  Duplicate(String),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("scheduled lookup not found: {0}")]
  ScheduledLookupNotFound(i64),

  #[error("scheduled lookup {0} is already complete")]
  AlreadyComplete(i64),

  #[error("flight not found: {0}")]
  FlightNotFound(i64),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      failure,
      message,
    )) = &e
      && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    {
      return Error::Duplicate(
        message.clone().unwrap_or_else(|| failure.to_string()),
      );
    }
    Error::Database(e)
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(self, Error::Duplicate(_) | Error::AlreadyComplete(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
