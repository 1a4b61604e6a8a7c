//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use verdant_core::ValidationError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The backing store failed or timed out; the request may be retried.
  #[error("unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ValidationError> for ApiError {
  fn from(e: ValidationError) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<verdant_core::Error> for ApiError {
  fn from(e: verdant_core::Error) -> Self {
    use verdant_core::Error as E;
    match e {
      E::Validation(v) => Self::BadRequest(v.to_string()),
      E::InvalidCredentials => Self::Unauthorized(e.to_string()),
      E::AccountExists(_) => Self::Conflict(e.to_string()),
      E::Lookup { .. } | E::Timeout { .. } => Self::Unavailable(e.to_string()),
      E::PasswordHash(_) | E::Store(_) => Self::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unavailable(m) => {
        (StatusCode::SERVICE_UNAVAILABLE, m.clone())
      }
      ApiError::Store(e) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
