//! HTTP server assembly for Verdant.
//!
//! Mounts the JSON API under `/api` with request tracing and a permissive
//! read-mostly CORS policy for the browser client.

pub mod demo;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
  },
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use verdant_core::{lookup::LookupConfig, store::Backend};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `verdant.toml` and
/// `VERDANT_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Populate an empty store with the demo catalogue at startup.
  pub seed_demo:  bool,
  pub lookup:     LookupConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       3000,
      store_path: PathBuf::from("~/.local/share/verdant/verdant.db"),
      seed_demo:  false,
      lookup:     LookupConfig::default(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level [`Router`] for `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: Backend + 'static,
{
  let cors = CorsLayer::new()
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([CONTENT_TYPE, AUTHORIZATION])
    .max_age(Duration::from_secs(60 * 60));

  Router::new()
    .nest("/api", verdant_api::api_router(store, config.lookup.clone()))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}
