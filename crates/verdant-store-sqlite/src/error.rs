//! Error type for `verdant-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A column held text that does not decode to its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("product not found: {0}")]
  ProductNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
