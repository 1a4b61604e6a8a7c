//! Product identifiers: the canonical form of a scan or manual entry.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Barcodes shorter than this are treated as incomplete.
pub const MIN_BARCODE_LEN: usize = 8;

const TOO_SHORT: &str = "enter at least 8 digits";

/// A trimmed, non-empty identifier, routed by its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProductIdentifier {
  /// An all-digit code of at least [`MIN_BARCODE_LEN`] characters.
  Barcode(String),
  /// A free-text name fragment, e.g. "Organic Apple".
  Name(String),
}

impl ProductIdentifier {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Barcode(s) | Self::Name(s) => s,
    }
  }

  pub fn is_barcode(&self) -> bool { matches!(self, Self::Barcode(_)) }
}

impl fmt::Display for ProductIdentifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductIdentifier {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { normalize(s) }
}

/// Normalize a scan result or search box entry.
///
/// All-digit input is a barcode and must meet the minimum length; anything
/// else is a name fragment. No coercion beyond trimming is applied.
pub fn normalize(input: &str) -> Result<ProductIdentifier, ValidationError> {
  let trimmed = non_empty(input)?;
  if trimmed.bytes().all(|b| b.is_ascii_digit()) {
    require_barcode_len(trimmed)?;
    Ok(ProductIdentifier::Barcode(trimmed.to_owned()))
  } else {
    Ok(ProductIdentifier::Name(trimmed.to_owned()))
  }
}

/// Normalize input from the manual barcode entry field.
///
/// Only the length is checked; routing non-numeric codes elsewhere is the
/// caller's business.
pub fn normalize_barcode(
  input: &str,
) -> Result<ProductIdentifier, ValidationError> {
  let trimmed = non_empty(input)?;
  require_barcode_len(trimmed)?;
  Ok(ProductIdentifier::Barcode(trimmed.to_owned()))
}

fn non_empty(input: &str) -> Result<&str, ValidationError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::new(
      "identifier",
      "enter a barcode or product name",
    ));
  }
  Ok(trimmed)
}

fn require_barcode_len(code: &str) -> Result<(), ValidationError> {
  if code.chars().count() < MIN_BARCODE_LEN {
    return Err(ValidationError::new("identifier", TOO_SHORT));
  }
  Ok(())
}
