//! User feedback submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  store::FeedbackStore,
  validation::{ValidationError, check_length, is_valid_email},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackCategory {
  #[default]
  General,
  Product,
  Website,
  Service,
  Other,
}

/// A feedback form submission as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
  pub name:     String,
  pub email:    String,
  /// 1 to 5 stars.
  pub rating:   u8,
  #[serde(default)]
  pub category: FeedbackCategory,
  pub message:  String,
}

impl NewFeedback {
  pub fn validate(&self) -> Result<(), ValidationError> {
    check_length("name", self.name.trim(), 2, None)?;
    if !is_valid_email(self.email.trim()) {
      return Err(ValidationError::new(
        "email",
        "please enter a valid email address",
      ));
    }
    if !(1..=5).contains(&self.rating) {
      return Err(ValidationError::new("rating", "please select a rating"));
    }
    check_length("message", self.message.trim(), 10, Some(500))
  }

  fn trimmed(self) -> Self {
    Self {
      name:     self.name.trim().to_owned(),
      email:    self.email.trim().to_owned(),
      rating:   self.rating,
      category: self.category,
      message:  self.message.trim().to_owned(),
    }
  }
}

/// A stored feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
  pub feedback_id: Uuid,
  pub name:        String,
  pub email:       String,
  pub rating:      u8,
  pub category:    FeedbackCategory,
  pub message:     String,
  pub created_at:  DateTime<Utc>,
}

/// Validate and persist a submission.
pub async fn submit<S: FeedbackStore>(
  store: &S,
  input: NewFeedback,
) -> Result<Feedback> {
  input.validate()?;
  let feedback = store
    .save_feedback(input.trimmed())
    .await
    .map_err(Error::store)?;
  tracing::info!(
    feedback_id = %feedback.feedback_id,
    category = %feedback.category,
    rating = feedback.rating,
    "feedback received"
  );
  Ok(feedback)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn valid() -> NewFeedback {
    NewFeedback {
      name:     "Ada".into(),
      email:    "ada@example.com".into(),
      rating:   5,
      category: FeedbackCategory::Product,
      message:  "The spinach scan worked great.".into(),
    }
  }

  #[test]
  fn accepts_valid_submission() { assert!(valid().validate().is_ok()); }

  #[test]
  fn rejects_short_name() {
    let err = NewFeedback { name: " A ".into(), ..valid() }.validate().unwrap_err();
    assert_eq!(err.field, "name");
  }

  #[test]
  fn rejects_bad_email() {
    let err = NewFeedback { email: "ada".into(), ..valid() }.validate().unwrap_err();
    assert_eq!(err.field, "email");
  }

  #[test]
  fn rejects_out_of_range_rating() {
    for rating in [0, 6] {
      let err = NewFeedback { rating, ..valid() }.validate().unwrap_err();
      assert_eq!(err.field, "rating");
    }
  }

  #[test]
  fn message_bounds() {
    let short = NewFeedback { message: "too short".into(), ..valid() };
    assert_eq!(short.validate().unwrap_err().field, "message");
    let long = NewFeedback { message: "x".repeat(501), ..valid() };
    assert_eq!(long.validate().unwrap_err().field, "message");
  }

  #[test]
  fn category_parses_from_lowercase() {
    assert_eq!("website".parse::<FeedbackCategory>().unwrap(), FeedbackCategory::Website);
    assert!("billing".parse::<FeedbackCategory>().is_err());
  }
}
