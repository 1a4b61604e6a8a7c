//! Product records and the rows that hang off them.
//!
//! A product owns an ordered list of nutrients, at most one preservation
//! guideline, and one verification record per certification source. The
//! workflow only reads these; writes belong to whoever runs the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Record groups ───────────────────────────────────────────────────────────

/// The four collections a product detail is assembled from. Also the unit of
/// change notification.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordGroup {
  Product,
  Nutrients,
  Preservation,
  Verifications,
}

impl RecordGroup {
  pub const ALL: [Self; 4] =
    [Self::Product, Self::Nutrients, Self::Preservation, Self::Verifications];
}

// ─── Product ─────────────────────────────────────────────────────────────────

/// A catalogued food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
  pub product_id:          Uuid,
  pub name:                String,
  pub barcode:             Option<String>,
  pub brand:               Option<String>,
  pub variety:             Option<String>,
  pub origin:              Option<String>,
  pub ingredients:         Option<String>,
  pub season:              Option<String>,
  pub growth_conditions:   Option<String>,
  pub organic_cultivation: Option<String>,
  /// The producer's own claim; independent of the aggregated verdict.
  pub is_organic:          bool,
  pub category_id:         Option<i64>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

/// Input for creating or replacing a product. Ids and timestamps are set by
/// the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
  pub name:                String,
  pub barcode:             Option<String>,
  pub brand:               Option<String>,
  pub variety:             Option<String>,
  pub origin:              Option<String>,
  pub ingredients:         Option<String>,
  pub season:              Option<String>,
  pub growth_conditions:   Option<String>,
  pub organic_cultivation: Option<String>,
  #[serde(default)]
  pub is_organic:          bool,
  pub category_id:         Option<i64>,
}

impl NewProduct {
  /// Convenience constructor with every optional field unset.
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
    self.barcode = Some(barcode.into());
    self
  }
}

/// A product grouping such as "Fruits" or "Leafy greens".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
  pub category_id: i64,
  pub name:        String,
  pub description: Option<String>,
}

// ─── Nutrition ───────────────────────────────────────────────────────────────

/// A nutrient quantity. Some sources report a qualitative level ("High")
/// instead of a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
  Amount(f64),
  Text(String),
}

impl NutrientValue {
  /// Parse the textual column form, preferring a number when it parses.
  pub fn parse(raw: &str) -> Self {
    match raw.trim().parse::<f64>() {
      Ok(n) if n.is_finite() => Self::Amount(n),
      _ => Self::Text(raw.to_owned()),
    }
  }
}

impl std::fmt::Display for NutrientValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Amount(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
  pub name:                String,
  pub value:               NutrientValue,
  pub unit:                Option<String>,
  /// `None` for nutrients without a defined daily value (e.g. antioxidants).
  pub daily_value_percent: Option<f64>,
}

// ─── Preservation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreservationGuideline {
  pub refrigerated_duration: String,
  pub room_temp_duration:    String,
  pub storage_method:        String,
  pub tips:                  String,
}

// ─── Verification ────────────────────────────────────────────────────────────

/// Where a verification record came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Read from the store.
  #[default]
  Real,
  /// Generated on the fly to populate the demo; not authoritative.
  Synthetic,
}

/// One certification body's claim about a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
  pub source_name:        String,
  pub verified:           bool,
  pub certification_id:   Option<String>,
  pub certification_date: Option<NaiveDate>,
  pub notes:              Option<String>,
  #[serde(default)]
  pub provenance:         Provenance,
}

impl VerificationRecord {
  /// A bare stored record with only the source and verdict set.
  pub fn new(source_name: impl Into<String>, verified: bool) -> Self {
    Self {
      source_name: source_name.into(),
      verified,
      certification_id: None,
      certification_date: None,
      notes: None,
      provenance: Provenance::Real,
    }
  }

  pub fn is_synthetic(&self) -> bool {
    self.provenance == Provenance::Synthetic
  }
}

/// A certification authority referenced by verification records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationSource {
  pub source_id:   i64,
  pub name:        String,
  pub description: Option<String>,
  pub website:     Option<String>,
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// Everything known about one product, assembled fresh on every lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
  pub product:       ProductRecord,
  pub nutrients:     Vec<Nutrient>,
  pub preservation:  Option<PreservationGuideline>,
  pub verifications: Vec<VerificationRecord>,
  /// Groups that failed to load and were replaced by empty defaults. Only
  /// ever non-empty under the best-effort partial failure policy.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub degraded:      Vec<RecordGroup>,
}

impl ProductDetail {
  pub fn is_degraded(&self) -> bool { !self.degraded.is_empty() }
}
