//! Product lookup: resolve an identifier to a fully assembled
//! [`ProductDetail`].
//!
//! Every store call goes through [`ProductLookup::attempt`], which applies a
//! per-call timeout and retries transport failures with linear backoff. A
//! confirmed absence (`Ok(None)`) is never retried.

use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  identifier::ProductIdentifier,
  product::{
    Nutrient, PreservationGuideline, ProductDetail, ProductRecord, RecordGroup,
    VerificationRecord,
  },
  store::ProductStore,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// What to do when some, but not all, dependent queries fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailure {
  /// Fail the whole lookup with the first error.
  #[default]
  AllOrNothing,
  /// Substitute empty collections and record the group in
  /// [`ProductDetail::degraded`].
  BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total tries per store call, including the first. Zero behaves as one.
  pub max_attempts:    usize,
  pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_attempts: 3, base_backoff_ms: 100 } }
}

impl RetryPolicy {
  /// Single attempt, no backoff.
  pub fn none() -> Self { Self { max_attempts: 1, base_backoff_ms: 0 } }

  pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
    Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
  /// Upper bound on a single store call.
  pub timeout_ms:         u64,
  pub retry:              RetryPolicy,
  pub partial_failure:    PartialFailure,
  /// Fill in synthetic verification records when none are stored.
  pub synthesize_missing: bool,
}

impl Default for LookupConfig {
  fn default() -> Self {
    Self {
      timeout_ms:         5_000,
      retry:              RetryPolicy::default(),
      partial_failure:    PartialFailure::default(),
      synthesize_missing: false,
    }
  }
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Resolves identifiers against a [`ProductStore`].
///
/// Cloning is cheap; the store is reference-counted.
pub struct ProductLookup<S> {
  pub(crate) store:  Arc<S>,
  pub(crate) config: LookupConfig,
}

impl<S> Clone for ProductLookup<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config.clone() }
  }
}

impl<S> ProductLookup<S>
where
  S: ProductStore + 'static,
{
  pub fn new(store: Arc<S>, config: LookupConfig) -> Self { Self { store, config } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &LookupConfig { &self.config }

  /// Route an identifier to the barcode or name lookup.
  pub async fn lookup(
    &self,
    identifier: &ProductIdentifier,
  ) -> Result<Option<ProductDetail>> {
    match identifier {
      ProductIdentifier::Barcode(code) => self.lookup_by_barcode(code).await,
      ProductIdentifier::Name(fragment) => self.lookup_by_name(fragment).await,
    }
  }

  #[instrument(skip(self))]
  pub async fn lookup_by_barcode(
    &self,
    barcode: &str,
  ) -> Result<Option<ProductDetail>> {
    let found = self
      .attempt("product query", || self.store.product_by_barcode(barcode))
      .await?;
    self.complete(found).await
  }

  /// Ambiguous matches are accepted silently; the first row wins.
  #[instrument(skip(self))]
  pub async fn lookup_by_name(
    &self,
    fragment: &str,
  ) -> Result<Option<ProductDetail>> {
    let found = self
      .attempt("product query", || self.store.product_by_name(fragment))
      .await?;
    self.complete(found).await
  }

  async fn complete(
    &self,
    found: Option<ProductRecord>,
  ) -> Result<Option<ProductDetail>> {
    match found {
      Some(product) => self.assemble(product).await.map(Some),
      None => {
        debug!("no matching product");
        Ok(None)
      }
    }
  }

  /// Fetch the three dependent groups concurrently and join them.
  async fn assemble(&self, product: ProductRecord) -> Result<ProductDetail> {
    let id = product.product_id;

    match self.config.partial_failure {
      PartialFailure::AllOrNothing => {
        let (nutrients, preservation, verifications) = tokio::try_join!(
          self.fetch_nutrients(id),
          self.fetch_preservation(id),
          self.fetch_verifications(id),
        )?;
        Ok(ProductDetail {
          product,
          nutrients,
          preservation,
          verifications,
          degraded: Vec::new(),
        })
      }
      PartialFailure::BestEffort => {
        let (nutrients, preservation, verifications) = tokio::join!(
          self.fetch_nutrients(id),
          self.fetch_preservation(id),
          self.fetch_verifications(id),
        );
        let mut degraded = Vec::new();
        Ok(ProductDetail {
          nutrients: recover(nutrients, RecordGroup::Nutrients, &mut degraded),
          preservation: recover(
            preservation,
            RecordGroup::Preservation,
            &mut degraded,
          ),
          verifications: recover(
            verifications,
            RecordGroup::Verifications,
            &mut degraded,
          ),
          product,
          degraded,
        })
      }
    }
  }

  /// Read one product row by id under the timeout and retry policy.
  pub async fn fetch_product(
    &self,
    product_id: Uuid,
  ) -> Result<Option<ProductRecord>> {
    self
      .attempt("product query", || self.store.product(product_id))
      .await
  }

  pub(crate) async fn fetch_nutrients(&self, product_id: Uuid) -> Result<Vec<Nutrient>> {
    self
      .attempt("nutrient query", || self.store.nutrients(product_id))
      .await
  }

  pub(crate) async fn fetch_preservation(
    &self,
    product_id: Uuid,
  ) -> Result<Option<PreservationGuideline>> {
    self
      .attempt("preservation query", || self.store.preservation(product_id))
      .await
  }

  pub(crate) async fn fetch_verifications(
    &self,
    product_id: Uuid,
  ) -> Result<Vec<VerificationRecord>> {
    self
      .attempt("verification query", || self.store.verifications(product_id))
      .await
  }

  /// Run one store call under the configured timeout and retry policy.
  async fn attempt<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, S::Error>>,
  {
    let timeout = Duration::from_millis(self.config.timeout_ms);
    let attempts = self.config.retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      let err = match tokio::time::timeout(timeout, call()).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => Error::Lookup { operation, source: Box::new(e) },
        Err(_) => Error::Timeout { operation, elapsed: timeout },
      };

      if attempt >= attempts {
        warn!(operation, attempt, error = %err, "store call failed; giving up");
        return Err(err);
      }

      let delay = self.config.retry.delay_for_attempt(attempt);
      warn!(operation, attempt, ?delay, error = %err, "store call failed; retrying");
      tokio::time::sleep(delay).await;
      attempt += 1;
    }
  }
}

fn recover<T: Default>(
  result: Result<T>,
  group: RecordGroup,
  degraded: &mut Vec<RecordGroup>,
) -> T {
  match result {
    Ok(value) => value,
    Err(e) => {
      warn!(%group, error = %e, "serving product detail without group");
      degraded.push(group);
      T::default()
    }
  }
}
