//! Change subscription relay.
//!
//! Opens one watch per [`RecordGroup`] for a product and turns raw change
//! events into refreshed collections for a [`ProductObserver`]. Child-group
//! events are only triggers: the relay re-reads the whole group before
//! calling the observer. Product events carry the written row and are
//! forwarded as-is.
//!
//! The four groups are served by independent tasks, so the observer sees no
//! ordering or atomicity across groups.

use std::sync::{
  Arc, Mutex, PoisonError,
  atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  change::{ChangeOp, Signal, Watch},
  lookup::ProductLookup,
  product::{
    Nutrient, PreservationGuideline, ProductRecord, RecordGroup,
    VerificationRecord,
  },
  store::{ChangeFeed, ProductStore},
  verification::{VerificationSummary, summarize},
};

/// A change to the product row itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductChange {
  Upserted(ProductRecord),
  Deleted(Uuid),
}

/// Receives refreshed state for a watched product. Every method defaults to
/// a no-op so observers implement only what they display.
pub trait ProductObserver: Send + Sync + 'static {
  fn product_changed(&self, _change: ProductChange) {}

  fn nutrients_changed(&self, _nutrients: Vec<Nutrient>) {}

  fn preservation_changed(&self, _preservation: Option<PreservationGuideline>) {}

  fn verifications_changed(
    &self,
    _records: Vec<VerificationRecord>,
    _summary: VerificationSummary,
  ) {
  }
}

/// Handle to the four relay tasks of one product. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
  product_id: Uuid,
  /// Checked by every task right before it calls the observer.
  active:     Arc<AtomicBool>,
  tasks:      Mutex<Vec<JoinHandle<()>>>,
}

impl Subscription {
  pub fn product_id(&self) -> Uuid { self.product_id }

  pub fn is_active(&self) -> bool {
    !self
      .tasks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .is_empty()
  }

  /// Tear down every watch. Safe to call repeatedly; returns `true` only for
  /// the call that actually performed the teardown.
  ///
  /// Once this returns, no new observer callback starts. A callback that was
  /// already running on another worker thread may still be finishing.
  pub fn unsubscribe(&self) -> bool {
    self.active.store(false, Ordering::Release);
    let tasks = std::mem::take(
      &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
    );
    if tasks.is_empty() {
      return false;
    }
    for task in &tasks {
      task.abort();
    }
    debug!(product_id = %self.product_id, "unsubscribed from product changes");
    true
  }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.unsubscribe(); }
}

impl<S> ProductLookup<S>
where
  S: ProductStore + ChangeFeed + 'static,
{
  /// Watch every record group of `product_id` and relay refreshed state to
  /// `observer`. Must be called from within a tokio runtime.
  pub fn subscribe<O>(&self, product_id: Uuid, observer: Arc<O>) -> Subscription
  where
    O: ProductObserver,
  {
    let active = Arc::new(AtomicBool::new(true));
    let tasks = RecordGroup::ALL
      .into_iter()
      .map(|group| {
        let watch = self.store.watch(group, product_id);
        let lookup = self.clone();
        let observer = Arc::clone(&observer);
        let active = Arc::clone(&active);
        tokio::spawn(async move {
          lookup.relay(watch, observer.as_ref(), &active).await
        })
      })
      .collect();

    debug!(%product_id, "subscribed to product changes");
    Subscription { product_id, active, tasks: Mutex::new(tasks) }
  }

  async fn relay<O>(&self, mut watch: Watch, observer: &O, active: &AtomicBool)
  where
    O: ProductObserver,
  {
    let group = watch.group();
    let product_id = watch.product_id();
    let live = || active.load(Ordering::Acquire);

    while let Some(signal) = watch.next().await {
      match group {
        RecordGroup::Product => {
          if let Some(change) = self.product_change(product_id, signal).await
            && live()
          {
            observer.product_changed(change);
          }
        }
        RecordGroup::Nutrients => match self.fetch_nutrients(product_id).await {
          Ok(nutrients) if live() => observer.nutrients_changed(nutrients),
          Ok(_) => {}
          Err(e) => warn!(%product_id, %group, error = %e, "refetch failed"),
        },
        RecordGroup::Preservation => {
          match self.fetch_preservation(product_id).await {
            Ok(guideline) if live() => observer.preservation_changed(guideline),
            Ok(_) => {}
            Err(e) => warn!(%product_id, %group, error = %e, "refetch failed"),
          }
        }
        RecordGroup::Verifications => {
          match self.fetch_verifications(product_id).await {
            Ok(records) if live() => {
              let summary = summarize(&records);
              observer.verifications_changed(records, summary);
            }
            Ok(_) => {}
            Err(e) => warn!(%product_id, %group, error = %e, "refetch failed"),
          }
        }
      }
      if !live() {
        break;
      }
    }

    debug!(%product_id, %group, "change feed closed");
  }

  /// Forward the pushed row; only a lag forces a re-read.
  async fn product_change(
    &self,
    product_id: Uuid,
    signal: Signal,
  ) -> Option<ProductChange> {
    match signal {
      Signal::Event(event) if event.op == ChangeOp::Delete => {
        Some(ProductChange::Deleted(product_id))
      }
      Signal::Event(event) if event.product.is_some() => {
        event.product.map(ProductChange::Upserted)
      }
      Signal::Event(_) | Signal::Lagged(_) => {
        match self.fetch_product(product_id).await {
          Ok(Some(record)) => Some(ProductChange::Upserted(record)),
          Ok(None) => Some(ProductChange::Deleted(product_id)),
          Err(e) => {
            warn!(%product_id, error = %e, "product refetch failed");
            None
          }
        }
      }
    }
  }
}
