//! In-memory store double for unit tests, with injectable failures and
//! delays per operation.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard},
  time::Duration,
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Session, StoredAccount},
  change::{ChangeEvent, ChangeHub, ChangeOp, Watch},
  feedback::{Feedback, NewFeedback},
  product::{
    Nutrient, PreservationGuideline, ProductRecord, RecordGroup,
    VerificationRecord,
  },
  store::{
    AccountStore, ChangeFeed, FeedbackStore, ProductStore, SessionStore, Store,
  },
};

#[derive(Debug, Error)]
#[error("backend unavailable during {0}")]
pub struct FakeError(pub &'static str);

#[derive(Default)]
struct State {
  products:      Vec<ProductRecord>,
  nutrients:     HashMap<Uuid, Vec<Nutrient>>,
  preservation:  HashMap<Uuid, PreservationGuideline>,
  verifications: HashMap<Uuid, Vec<VerificationRecord>>,
  feedback:      Vec<Feedback>,
  accounts:      Vec<StoredAccount>,
  sessions:      HashMap<Uuid, Session>,
  /// Remaining forced failures per operation; `usize::MAX` means always.
  failures:      HashMap<&'static str, usize>,
  delays:        HashMap<&'static str, Duration>,
  calls:         HashMap<&'static str, usize>,
}

#[derive(Default)]
pub struct FakeStore {
  state: Mutex<State>,
  hub:   ChangeHub,
}

pub fn product(name: &str, barcode: Option<&str>) -> ProductRecord {
  let now = Utc::now();
  ProductRecord {
    product_id:          Uuid::new_v4(),
    name:                name.into(),
    barcode:             barcode.map(Into::into),
    brand:               None,
    variety:             None,
    origin:              None,
    ingredients:         None,
    season:              None,
    growth_conditions:   None,
    organic_cultivation: None,
    is_organic:          true,
    category_id:         None,
    created_at:          now,
    updated_at:          now,
  }
}

impl FakeStore {
  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }

  pub fn hub(&self) -> &ChangeHub { &self.hub }

  pub fn insert_product(&self, record: ProductRecord) {
    self.state().products.push(record);
  }

  pub fn push_nutrient(&self, product_id: Uuid, nutrient: Nutrient) {
    self.state().nutrients.entry(product_id).or_default().push(nutrient);
  }

  pub fn set_preservation(&self, product_id: Uuid, guideline: PreservationGuideline) {
    self.state().preservation.insert(product_id, guideline);
  }

  pub fn push_verification(&self, product_id: Uuid, record: VerificationRecord) {
    self
      .state()
      .verifications
      .entry(product_id)
      .or_default()
      .push(record);
  }

  /// Write a verification and notify watchers, like a real backend would.
  pub fn record_verification(&self, product_id: Uuid, record: VerificationRecord) {
    self.push_verification(product_id, record);
    self.hub.publish(ChangeEvent::trigger(
      RecordGroup::Verifications,
      product_id,
      ChangeOp::Insert,
    ));
  }

  pub fn fail(&self, op: &'static str) { self.state().failures.insert(op, usize::MAX); }

  pub fn fail_times(&self, op: &'static str, times: usize) {
    self.state().failures.insert(op, times);
  }

  pub fn recover(&self, op: &'static str) { self.state().failures.remove(op); }

  pub fn delay(&self, op: &'static str, by: Duration) { self.state().delays.insert(op, by); }

  pub fn calls(&self, op: &'static str) -> usize {
    self.state().calls.get(op).copied().unwrap_or(0)
  }

  /// Count the call, then apply any configured delay and failure.
  async fn enter(&self, op: &'static str) -> Result<(), FakeError> {
    let delay = {
      let mut state = self.state();
      *state.calls.entry(op).or_default() += 1;
      state.delays.get(op).copied()
    };
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    let mut state = self.state();
    match state.failures.get_mut(op) {
      Some(remaining) if *remaining > 0 => {
        if *remaining != usize::MAX {
          *remaining -= 1;
        }
        Err(FakeError(op))
      }
      _ => Ok(()),
    }
  }
}

impl Store for FakeStore {
  type Error = FakeError;
}

impl ProductStore for FakeStore {
  async fn product(&self, product_id: Uuid) -> Result<Option<ProductRecord>, FakeError> {
    self.enter("product").await?;
    Ok(self.state().products.iter().find(|p| p.product_id == product_id).cloned())
  }

  async fn product_by_barcode<'a>(&'a self, barcode: &'a str) -> Result<Option<ProductRecord>, FakeError> {
    self.enter("product_by_barcode").await?;
    Ok(
      self
        .state()
        .products
        .iter()
        .find(|p| p.barcode.as_deref() == Some(barcode))
        .cloned(),
    )
  }

  async fn product_by_name<'a>(&'a self, fragment: &'a str) -> Result<Option<ProductRecord>, FakeError> {
    self.enter("product_by_name").await?;
    let needle = fragment.to_lowercase();
    Ok(
      self
        .state()
        .products
        .iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .cloned(),
    )
  }

  async fn nutrients(&self, product_id: Uuid) -> Result<Vec<Nutrient>, FakeError> {
    self.enter("nutrients").await?;
    Ok(self.state().nutrients.get(&product_id).cloned().unwrap_or_default())
  }

  async fn preservation(
    &self,
    product_id: Uuid,
  ) -> Result<Option<PreservationGuideline>, FakeError> {
    self.enter("preservation").await?;
    Ok(self.state().preservation.get(&product_id).cloned())
  }

  async fn verifications(
    &self,
    product_id: Uuid,
  ) -> Result<Vec<VerificationRecord>, FakeError> {
    self.enter("verifications").await?;
    Ok(self.state().verifications.get(&product_id).cloned().unwrap_or_default())
  }
}

impl ChangeFeed for FakeStore {
  fn watch(&self, group: RecordGroup, product_id: Uuid) -> Watch {
    self.hub.watch(group, product_id)
  }
}

impl FeedbackStore for FakeStore {
  async fn save_feedback(&self, input: NewFeedback) -> Result<Feedback, FakeError> {
    self.enter("save_feedback").await?;
    let feedback = Feedback {
      feedback_id: Uuid::new_v4(),
      name:        input.name,
      email:       input.email,
      rating:      input.rating,
      category:    input.category,
      message:     input.message,
      created_at:  Utc::now(),
    };
    self.state().feedback.insert(0, feedback.clone());
    Ok(feedback)
  }

  async fn list_feedback(&self) -> Result<Vec<Feedback>, FakeError> {
    self.enter("list_feedback").await?;
    Ok(self.state().feedback.clone())
  }
}

impl AccountStore for FakeStore {
  async fn create_account(&self, input: NewAccount) -> Result<Option<StoredAccount>, FakeError> {
    self.enter("create_account").await?;
    let mut state = self.state();
    if state.accounts.iter().any(|a| a.account.email == input.email) {
      return Ok(None);
    }
    let stored = StoredAccount {
      account:       Account {
        account_id: Uuid::new_v4(),
        email:      input.email,
        name:       input.name,
        created_at: Utc::now(),
      },
      password_hash: input.password_hash,
    };
    state.accounts.push(stored.clone());
    Ok(Some(stored))
  }

  async fn account_by_email<'a>(&'a self, email: &'a str) -> Result<Option<StoredAccount>, FakeError> {
    self.enter("account_by_email").await?;
    Ok(self.state().accounts.iter().find(|a| a.account.email == email).cloned())
  }
}

impl SessionStore for FakeStore {
  async fn save_session<'a>(&'a self, session: &'a Session) -> Result<(), FakeError> {
    self.enter("save_session").await?;
    self.state().sessions.insert(session.token, session.clone());
    Ok(())
  }

  async fn load_session(&self, token: Uuid) -> Result<Option<Session>, FakeError> {
    self.enter("load_session").await?;
    Ok(self.state().sessions.get(&token).cloned())
  }

  async fn clear_session(&self, token: Uuid) -> Result<bool, FakeError> {
    self.enter("clear_session").await?;
    Ok(self.state().sessions.remove(&token).is_some())
  }
}
