//! Error types for `verdant-core`.

use std::time::Duration;

use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
  /// User-correctable input problem.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// A store query failed in transport or in the backend itself. Distinct
  /// from a confirmed absence, which is reported as `Ok(None)`.
  #[error("{operation} failed: {source}")]
  Lookup {
    operation: &'static str,
    #[source]
    source:    Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("{operation} timed out after {elapsed:?}")]
  Timeout {
    operation: &'static str,
    elapsed:   Duration,
  },

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("an account already exists for {0}")]
  AccountExists(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  /// Failure of a non-lookup store (feedback, accounts, sessions).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Transport faults and timeouts may succeed on a later attempt.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Lookup { .. } | Self::Timeout { .. })
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
