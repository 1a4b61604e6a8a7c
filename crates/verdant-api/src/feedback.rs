//! Handlers for `/feedback`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use verdant_core::{
  Error,
  feedback::{Feedback, NewFeedback, submit},
  store::{Backend, FeedbackStore},
};

use crate::{AppState, error::ApiError};

/// `GET /feedback` — newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Feedback>>, ApiError>
where
  S: Backend + 'static,
{
  let feedback = state
    .store
    .list_feedback()
    .await
    .map_err(|e| ApiError::from(Error::Store(Box::new(e))))?;
  Ok(Json(feedback))
}

/// `POST /feedback`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewFeedback>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend + 'static,
{
  let feedback = submit(state.store.as_ref(), body).await?;
  Ok((StatusCode::CREATED, Json(feedback)))
}
