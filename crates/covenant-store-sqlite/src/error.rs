//! Error type for `covenant-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] covenant_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("contract not found: {0}")]
  ContractNotFound(uuid::Uuid),

  #[error("clause not found: {0}")]
  ClauseNotFound(uuid::Uuid),

  #[error("alert not found: {0}")]
  AlertNotFound(uuid::Uuid),

  /// The unique, immutable contract number collided on insert.
  #[error("contract number already exists: {0:?}")]
  DuplicateContractNumber(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
