//! Core types and workflow for Verdant, the organic product verification
//! service.
//!
//! This crate holds the domain model, the identifier normalizer, the
//! verification aggregator, and the lookup/relay workflow that runs against
//! any backend implementing the traits in [`store`]. It is free of HTTP and
//! database dependencies.

// Store implementations write `async fn` against the RPITIT signatures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod change;
pub mod error;
pub mod feedback;
pub mod identifier;
pub mod lookup;
pub mod product;
pub mod relay;
pub mod scan;
pub mod store;
pub mod validation;
pub mod verification;

pub use error::{Error, Result};
pub use validation::ValidationError;

#[cfg(test)]
mod testing;
