//! Handlers for `/auth` endpoints.
//!
//! Sessions are identified by an opaque token sent back as
//! `Authorization: Bearer <token>`.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header::AUTHORIZATION},
  response::IntoResponse,
};
use uuid::Uuid;
use verdant_core::{
  account::{Credentials, Registration, Session},
  store::Backend,
};

use crate::{AppState, error::ApiError};

/// Extract the session token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Result<Uuid, ApiError> {
  let value = headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
  let token = value
    .strip_prefix("Bearer ")
    .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".into()))?;
  Uuid::parse_str(token.trim())
    .map_err(|_| ApiError::Unauthorized("malformed bearer token".into()))
}

/// `POST /auth/register` — body: `{"email":..,"password":..,"name":..}`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Registration>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend + 'static,
{
  let session = state.accounts.register(body).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /auth/login` — body: `{"email":..,"password":..}`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<Json<Session>, ApiError>
where
  S: Backend + 'static,
{
  Ok(Json(state.accounts.login(body).await?))
}

/// `POST /auth/logout` — idempotent; an already-cleared token still yields
/// 204.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: Backend + 'static,
{
  let token = bearer_token(&headers)?;
  state.accounts.logout(token).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn session<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Session>, ApiError>
where
  S: Backend + 'static,
{
  let token = bearer_token(&headers)?;
  let session = state
    .accounts
    .session(token)
    .await?
    .ok_or_else(|| ApiError::Unauthorized("session expired or unknown".into()))?;
  Ok(Json(session))
}
