//! The end-to-end scan workflow: normalize, look up, aggregate.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Result,
  identifier::{ProductIdentifier, normalize},
  lookup::ProductLookup,
  product::{ProductDetail, VerificationRecord},
  store::ProductStore,
  verification::{VerificationSummary, summarize, synthesize_now},
};

/// A found product with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
  pub detail:  ProductDetail,
  pub summary: VerificationSummary,
}

impl From<ProductDetail> for ProductReport {
  fn from(detail: ProductDetail) -> Self {
    let summary = summarize(&detail.verifications);
    Self { detail, summary }
  }
}

/// Outcome of one scan or manual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
  pub identifier:  ProductIdentifier,
  /// `None` when no product matched.
  pub detail:      Option<ProductDetail>,
  /// Demo records generated because nothing was stored. Kept apart from
  /// `detail` so they can never be mistaken for stored data.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub synthesized: Vec<VerificationRecord>,
  pub summary:     VerificationSummary,
}

impl<S> ProductLookup<S>
where
  S: ProductStore + 'static,
{
  /// Run a raw scan result or manual entry through the whole workflow.
  pub async fn scan(&self, raw: &str) -> Result<ScanReport> {
    let identifier = normalize(raw)?;
    let detail = self.lookup(&identifier).await?;

    let stored = detail.as_ref().map_or(&[][..], |d| &d.verifications[..]);
    let synthesized = if stored.is_empty() && self.config.synthesize_missing {
      synthesize_now()
    } else {
      Vec::new()
    };
    let summary = if synthesized.is_empty() {
      summarize(stored)
    } else {
      summarize(&synthesized)
    };

    info!(
      %identifier,
      found = detail.is_some(),
      status = %summary.status,
      synthetic = summary.synthetic,
      "scan complete"
    );
    Ok(ScanReport { identifier, detail, synthesized, summary })
  }
}
