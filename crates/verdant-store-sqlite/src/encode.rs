//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, UUIDs as
//! hyphenated lowercase strings, and enums as their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use verdant_core::{
  account::{Account, Session, StoredAccount},
  feedback::{Feedback, FeedbackCategory},
  product::{
    Nutrient, NutrientValue, ProductRecord, Provenance, VerificationRecord,
  },
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_provenance(p: Provenance) -> &'static str {
  match p {
    Provenance::Real => "real",
    Provenance::Synthetic => "synthetic",
  }
}

pub fn decode_provenance(s: &str) -> Result<Provenance> {
  match s {
    "real" => Ok(Provenance::Real),
    "synthetic" => Ok(Provenance::Synthetic),
    other => Err(Error::Decode(format!("unknown provenance: {other:?}"))),
  }
}

pub fn decode_category(s: &str) -> Result<FeedbackCategory> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown feedback category: {s:?}")))
}

// ─── Nutrient value ──────────────────────────────────────────────────────────

pub fn encode_nutrient_value(v: &NutrientValue) -> String { v.to_string() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawProduct`]'s field order.
pub const PRODUCT_COLUMNS: &str = "product_id, name, barcode, brand, variety, \
  origin, ingredients, season, growth_conditions, organic_cultivation, \
  is_organic, category_id, created_at, updated_at";

/// Raw values read directly from a `food_items` row.
pub struct RawProduct {
  pub product_id:          String,
  pub name:                String,
  pub barcode:             Option<String>,
  pub brand:               Option<String>,
  pub variety:             Option<String>,
  pub origin:              Option<String>,
  pub ingredients:         Option<String>,
  pub season:              Option<String>,
  pub growth_conditions:   Option<String>,
  pub organic_cultivation: Option<String>,
  pub is_organic:          bool,
  pub category_id:         Option<i64>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:          row.get(0)?,
      name:                row.get(1)?,
      barcode:             row.get(2)?,
      brand:               row.get(3)?,
      variety:             row.get(4)?,
      origin:              row.get(5)?,
      ingredients:         row.get(6)?,
      season:              row.get(7)?,
      growth_conditions:   row.get(8)?,
      organic_cultivation: row.get(9)?,
      is_organic:          row.get(10)?,
      category_id:         row.get(11)?,
      created_at:          row.get(12)?,
      updated_at:          row.get(13)?,
    })
  }

  pub fn into_record(self) -> Result<ProductRecord> {
    Ok(ProductRecord {
      product_id:          decode_uuid(&self.product_id)?,
      name:                self.name,
      barcode:             self.barcode,
      brand:               self.brand,
      variety:             self.variety,
      origin:              self.origin,
      ingredients:         self.ingredients,
      season:              self.season,
      growth_conditions:   self.growth_conditions,
      organic_cultivation: self.organic_cultivation,
      is_organic:          self.is_organic,
      category_id:         self.category_id,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawNutrient {
  pub name:                String,
  pub value:               String,
  pub unit:                Option<String>,
  pub daily_value_percent: Option<f64>,
}

impl RawNutrient {
  pub fn into_nutrient(self) -> Nutrient {
    Nutrient {
      name:                self.name,
      value:               NutrientValue::parse(&self.value),
      unit:                self.unit,
      daily_value_percent: self.daily_value_percent,
    }
  }
}

/// A verification row joined with its certification source name.
pub struct RawVerification {
  pub source_name:        String,
  pub verified:           bool,
  pub certification_id:   Option<String>,
  pub certification_date: Option<String>,
  pub notes:              Option<String>,
  pub provenance:         String,
}

impl RawVerification {
  pub fn into_record(self) -> Result<VerificationRecord> {
    Ok(VerificationRecord {
      source_name:        self.source_name,
      verified:           self.verified,
      certification_id:   self.certification_id,
      certification_date: self
        .certification_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      notes:              self.notes,
      provenance:         decode_provenance(&self.provenance)?,
    })
  }
}

pub struct RawFeedback {
  pub feedback_id: String,
  pub name:        String,
  pub email:       String,
  pub rating:      u8,
  pub category:    String,
  pub message:     String,
  pub created_at:  String,
}

impl RawFeedback {
  pub fn into_feedback(self) -> Result<Feedback> {
    Ok(Feedback {
      feedback_id: decode_uuid(&self.feedback_id)?,
      name:        self.name,
      email:       self.email,
      rating:      self.rating,
      category:    decode_category(&self.category)?,
      message:     self.message,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_stored(self) -> Result<StoredAccount> {
    Ok(StoredAccount {
      account:       Account {
        account_id: decode_uuid(&self.account_id)?,
        email:      self.email,
        name:       self.name,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}

/// A session row joined with its account.
pub struct RawSession {
  pub token:      String,
  pub started_at: String,
  pub account:    RawAccount,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token:      decode_uuid(&self.token)?,
      started_at: decode_dt(&self.started_at)?,
      account:    self.account.into_stored()?.account,
    })
  }
}
