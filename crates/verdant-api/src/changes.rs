//! `GET /products/{product_id}/changes`: live product updates as
//! server-sent events.
//!
//! Each relay callback becomes one event named after its record group
//! (`product`, `nutrients`, `preservation`, `verifications`) with the
//! refreshed state as JSON data. The subscription lives exactly as long as
//! the response body, so a client hanging up tears down the watches.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::{Path, State},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt as _, channel::mpsc, stream};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use verdant_core::{
  product::{Nutrient, PreservationGuideline, VerificationRecord},
  relay::{ProductChange, ProductObserver},
  store::Backend,
  verification::VerificationSummary,
};

use crate::{AppState, error::ApiError};

#[derive(Serialize)]
struct Verifications {
  records: Vec<VerificationRecord>,
  summary: VerificationSummary,
}

/// Turns observer callbacks into SSE events on an unbounded channel.
struct Forward(mpsc::UnboundedSender<Event>);

impl Forward {
  fn send<T: Serialize>(&self, name: &'static str, payload: &T) {
    match Event::default().event(name).json_data(payload) {
      // A closed channel means the client is gone and the stream drop is
      // already unsubscribing.
      Ok(event) => {
        self.0.unbounded_send(event).ok();
      }
      Err(e) => warn!(event = name, error = %e, "failed to encode change event"),
    }
  }
}

impl ProductObserver for Forward {
  fn product_changed(&self, change: ProductChange) { self.send("product", &change); }

  fn nutrients_changed(&self, nutrients: Vec<Nutrient>) {
    self.send("nutrients", &nutrients);
  }

  fn preservation_changed(&self, preservation: Option<PreservationGuideline>) {
    self.send("preservation", &preservation);
  }

  fn verifications_changed(
    &self,
    records: Vec<VerificationRecord>,
    summary: VerificationSummary,
  ) {
    self.send("verifications", &Verifications { records, summary });
  }
}

/// `GET /products/{product_id}/changes`. 404 if the product is unknown.
pub async fn events<S>(
  State(state): State<AppState<S>>,
  Path(product_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: Backend + 'static,
{
  state
    .lookup
    .fetch_product(product_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no product with id {product_id}")))?;

  let (tx, rx) = mpsc::unbounded();
  let subscription = state.lookup.subscribe(product_id, Arc::new(Forward(tx)));
  debug!(%product_id, "change stream opened");

  let events = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
    let event = rx.next().await?;
    Some((Ok::<_, Infallible>(event), (rx, subscription)))
  });
  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
