//! Change notifications published by a store and watched by the relay.
//!
//! A store owns one [`ChangeHub`] and publishes an event after every write.
//! Each [`Watch`] sees only the events for one record group of one product.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::product::{ProductRecord, RecordGroup};

/// Default number of events buffered per watcher before it lags.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
  Insert,
  Update,
  Delete,
}

/// A write to one record group of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub group:      RecordGroup,
  pub product_id: Uuid,
  pub op:         ChangeOp,
  /// The written row for product inserts and updates. Child groups carry no
  /// payload; the event is only a trigger to re-read.
  pub product:    Option<ProductRecord>,
}

impl ChangeEvent {
  pub fn trigger(group: RecordGroup, product_id: Uuid, op: ChangeOp) -> Self {
    Self { group, product_id, op, product: None }
  }

  pub fn product(op: ChangeOp, record: ProductRecord) -> Self {
    Self {
      group: RecordGroup::Product,
      product_id: record.product_id,
      op,
      product: Some(record),
    }
  }
}

/// Fan-out point for change events.
///
/// Cloning is cheap; all clones publish to the same watchers.
#[derive(Debug, Clone)]
pub struct ChangeHub {
  tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

impl ChangeHub {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn publish(&self, event: ChangeEvent) {
    let (group, product_id) = (event.group, event.product_id);
    if self.tx.send(event).is_err() {
      trace!(%group, %product_id, "change published with no watchers");
    }
  }

  /// Open a watch filtered to `group` of `product_id`.
  pub fn watch(&self, group: RecordGroup, product_id: Uuid) -> Watch {
    Watch { group, product_id, rx: self.tx.subscribe() }
  }

  /// Number of open watches across all groups and products.
  pub fn watcher_count(&self) -> usize { self.tx.receiver_count() }
}

/// What a watch yields.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
  Event(ChangeEvent),
  /// The watcher fell behind and `n` events were dropped; state must be
  /// re-read.
  Lagged(u64),
}

/// A filtered subscription to a [`ChangeHub`]. Dropping it closes the
/// channel.
#[derive(Debug)]
pub struct Watch {
  group:      RecordGroup,
  product_id: Uuid,
  rx:         broadcast::Receiver<ChangeEvent>,
}

impl Watch {
  pub fn group(&self) -> RecordGroup { self.group }

  pub fn product_id(&self) -> Uuid { self.product_id }

  /// Wait for the next matching signal. `None` once the hub is gone.
  pub async fn next(&mut self) -> Option<Signal> {
    loop {
      match self.rx.recv().await {
        Ok(event)
          if event.group == self.group && event.product_id == self.product_id =>
        {
          return Some(Signal::Event(event));
        }
        Ok(_) => continue,
        Err(RecvError::Lagged(skipped)) => {
          warn!(
            group = %self.group,
            product_id = %self.product_id,
            skipped,
            "change watch lagged"
          );
          return Some(Signal::Lagged(skipped));
        }
        Err(RecvError::Closed) => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn watch_filters_by_group_and_product() {
    let hub = ChangeHub::default();
    let id = Uuid::new_v4();
    let mut watch = hub.watch(RecordGroup::Nutrients, id);

    hub.publish(ChangeEvent::trigger(RecordGroup::Nutrients, Uuid::new_v4(), ChangeOp::Insert));
    hub.publish(ChangeEvent::trigger(RecordGroup::Preservation, id, ChangeOp::Insert));
    hub.publish(ChangeEvent::trigger(RecordGroup::Nutrients, id, ChangeOp::Update));

    let signal = watch.next().await.unwrap();
    assert_eq!(
      signal,
      Signal::Event(ChangeEvent::trigger(RecordGroup::Nutrients, id, ChangeOp::Update))
    );
  }

  #[tokio::test]
  async fn watch_reports_lag() {
    let hub = ChangeHub::new(1);
    let id = Uuid::new_v4();
    let mut watch = hub.watch(RecordGroup::Verifications, id);

    for _ in 0..3 {
      hub.publish(ChangeEvent::trigger(RecordGroup::Verifications, id, ChangeOp::Insert));
    }
    assert!(matches!(watch.next().await, Some(Signal::Lagged(_))));
  }

  #[tokio::test]
  async fn watch_ends_when_hub_dropped() {
    let hub = ChangeHub::default();
    let mut watch = hub.watch(RecordGroup::Product, Uuid::new_v4());
    drop(hub);
    assert!(watch.next().await.is_none());
  }

  #[test]
  fn watcher_count_tracks_open_watches() {
    let hub = ChangeHub::default();
    assert_eq!(hub.watcher_count(), 0);
    let a = hub.watch(RecordGroup::Product, Uuid::new_v4());
    let _b = hub.watch(RecordGroup::Nutrients, Uuid::new_v4());
    assert_eq!(hub.watcher_count(), 2);
    drop(a);
    assert_eq!(hub.watcher_count(), 1);
  }
}
