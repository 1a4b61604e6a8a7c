//! JSON REST API for Verdant.
//!
//! Exposes an axum [`Router`] backed by any [`verdant_core::store::Backend`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", verdant_api::api_router(store.clone(), lookup_config))
//! ```

pub mod auth;
pub mod changes;
pub mod error;
pub mod feedback;
pub mod products;
pub mod scan;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use verdant_core::{
  account::Accounts,
  lookup::{LookupConfig, ProductLookup},
  store::Backend,
};

pub use error::ApiError;

/// Shared handler state: the lookup workflow, the account service and the
/// raw store, all over one backend.
pub struct AppState<S> {
  pub lookup:   ProductLookup<S>,
  pub accounts: Accounts<S>,
  pub store:    Arc<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      lookup:   self.lookup.clone(),
      accounts: self.accounts.clone(),
      store:    Arc::clone(&self.store),
    }
  }
}

impl<S> AppState<S>
where
  S: Backend + 'static,
{
  pub fn new(store: Arc<S>, config: LookupConfig) -> Self {
    Self {
      lookup: ProductLookup::new(Arc::clone(&store), config),
      accounts: Accounts::new(Arc::clone(&store)),
      store,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, config: LookupConfig) -> Router<()>
where
  S: Backend + 'static,
{
  Router::new()
    // Scanning and lookup
    .route("/scan", get(scan::handler::<S>))
    .route("/products/barcode/{barcode}", get(products::by_barcode::<S>))
    .route("/products/search", get(products::search::<S>))
    .route("/products/{product_id}/changes", get(changes::events::<S>))
    // Feedback
    .route("/feedback", get(feedback::list::<S>).post(feedback::create::<S>))
    // Accounts
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/session", get(auth::session::<S>))
    .with_state(AppState::new(store, config))
}
