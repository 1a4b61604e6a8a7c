//! Handlers for `/products` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products/barcode/{barcode}` | 400 if shorter than 8 digits, 404 if unknown |
//! | `GET`  | `/products/search?name=` | First match wins; 404 if none |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use verdant_core::{
  identifier::{ProductIdentifier, normalize_barcode},
  scan::ProductReport,
  store::Backend,
};

use crate::{AppState, error::ApiError};

// ─── By barcode ──────────────────────────────────────────────────────────────

/// `GET /products/barcode/{barcode}`
pub async fn by_barcode<S>(
  State(state): State<AppState<S>>,
  Path(barcode): Path<String>,
) -> Result<Json<ProductReport>, ApiError>
where
  S: Backend + 'static,
{
  let identifier = normalize_barcode(&barcode)?;
  let detail = state
    .lookup
    .lookup_by_barcode(identifier.as_str())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no product with barcode {identifier}")))?;
  Ok(Json(detail.into()))
}

// ─── By name ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub name: String,
}

/// `GET /products/search?name=<fragment>`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<ProductReport>, ApiError>
where
  S: Backend + 'static,
{
  let fragment = params.name.trim();
  if fragment.is_empty() {
    return Err(ApiError::BadRequest("name: enter a product name".into()));
  }
  let identifier = ProductIdentifier::Name(fragment.to_owned());
  let detail = state
    .lookup
    .lookup(&identifier)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no product matching {fragment:?}")))?;
  Ok(Json(detail.into()))
}
