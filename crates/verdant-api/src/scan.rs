//! Handler for `GET /scan`.
//!
//! Takes a raw scanner result or manual entry and runs the whole scan
//! workflow over it.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use verdant_core::{scan::ScanReport, store::Backend};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ScanParams {
  /// Barcode digits or a product name fragment.
  pub code: String,
}

/// `GET /scan?code=<barcode or name>`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ScanParams>,
) -> Result<Json<ScanReport>, ApiError>
where
  S: Backend + 'static,
{
  let report = state.lookup.scan(&params.code).await?;
  Ok(Json(report))
}
