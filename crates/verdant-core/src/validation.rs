//! Input validation shared by the identifier, feedback and account paths.

use thiserror::Error;

/// A rejected input, with a reason fit to show next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
  pub field:  &'static str,
  pub reason: String,
}

impl ValidationError {
  pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
    Self { field, reason: reason.into() }
  }
}

/// Loose `local@domain.tld` shape check; deliverability is not our concern.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || email.chars().any(char::is_whitespace) {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !domain.contains('@'),
    None => false,
  }
}

/// Require `value` to hold between `min` and `max` characters (inclusive).
pub fn check_length(
  field: &'static str,
  value: &str,
  min: usize,
  max: Option<usize>,
) -> Result<(), ValidationError> {
  let len = value.chars().count();
  if len < min {
    return Err(ValidationError::new(
      field,
      format!("must be at least {min} characters"),
    ));
  }
  if let Some(max) = max
    && len > max
  {
    return Err(ValidationError::new(
      field,
      format!("can't be longer than {max} characters"),
    ));
  }
  Ok(())
}
