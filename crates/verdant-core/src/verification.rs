//! Cross-source verification aggregation.
//!
//! A product is classified by a strict majority over its verification
//! records. When no records exist the demo can synthesize a few, tagged
//! [`Provenance::Synthetic`] so they never pass for real data.

use chrono::{Days, NaiveDate};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::product::{Provenance, VerificationRecord};

/// Certification bodies synthesized records are attributed to.
pub const CERTIFICATION_BODIES: [&str; 5] = [
  "USDA Organic",
  "EU Organic",
  "India Organic (NPOP)",
  "Ecocert",
  "Soil Association",
];

/// Number of records produced by [`synthesize`].
pub const SYNTHETIC_RECORD_COUNT: usize = 3;

/// Overall classification derived from a set of verification records.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregatedStatus {
  Organic,
  NotOrganic,
  Unverified,
}

/// Classify `records` by strict majority.
///
/// Ties go against organic. Duplicate source names are counted as-is.
pub fn aggregate(records: &[VerificationRecord]) -> AggregatedStatus {
  let total = records.len();
  if total == 0 {
    return AggregatedStatus::Unverified;
  }
  let verified = records.iter().filter(|r| r.verified).count();
  if verified * 2 > total {
    AggregatedStatus::Organic
  } else {
    AggregatedStatus::NotOrganic
  }
}

/// The verdict together with the counts behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
  pub status:    AggregatedStatus,
  pub verified:  usize,
  pub total:     usize,
  /// Set when any contributing record was synthesized.
  pub synthetic: bool,
}

pub fn summarize(records: &[VerificationRecord]) -> VerificationSummary {
  VerificationSummary {
    status:    aggregate(records),
    verified:  records.iter().filter(|r| r.verified).count(),
    total:     records.len(),
    synthetic: records.iter().any(VerificationRecord::is_synthetic),
  }
}

/// Generate [`SYNTHETIC_RECORD_COUNT`] plausible records from distinct
/// certification bodies. Verified flags and dates are drawn independently on
/// every call.
pub fn synthesize<R>(rng: &mut R, today: NaiveDate) -> Vec<VerificationRecord>
where
  R: Rng + ?Sized,
{
  let sources: Vec<&str> = CERTIFICATION_BODIES
    .choose_multiple(rng, SYNTHETIC_RECORD_COUNT)
    .copied()
    .collect();

  sources
    .into_iter()
    .map(|source| {
      let verified = rng.gen_bool(0.5);
      let (certification_id, certification_date) = if verified {
        let serial: u32 = rng.gen_range(100_000..1_000_000);
        let age = Days::new(rng.gen_range(30..=730));
        (Some(format!("SYN-{serial}")), today.checked_sub_days(age))
      } else {
        (None, None)
      };
      VerificationRecord {
        source_name: source.to_owned(),
        verified,
        certification_id,
        certification_date,
        notes: Some("generated demo data, not an issued certification".into()),
        provenance: Provenance::Synthetic,
      }
    })
    .collect()
}

/// [`synthesize`] with the thread RNG and today's date.
pub fn synthesize_now() -> Vec<VerificationRecord> {
  synthesize(&mut rand::thread_rng(), chrono::Utc::now().date_naive())
}
