//! Store traits, the boundary between the workflow and whatever backs it.
//!
//! The traits are implemented by storage backends (e.g.
//! `verdant-store-sqlite`). Higher layers (`verdant-api`, the server) depend
//! on these abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{NewAccount, Session, StoredAccount},
  change::Watch,
  feedback::{Feedback, NewFeedback},
  product::{
    Nutrient, PreservationGuideline, ProductRecord, RecordGroup,
    VerificationRecord,
  },
};

/// Common error type shared by every store capability a backend offers.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Products ────────────────────────────────────────────────────────────────

/// Read access to the four product collections.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProductStore: Store {
  /// Retrieve a product by id. Returns `None` if not found.
  fn product(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Option<ProductRecord>, Self::Error>> + Send + '_;

  /// Exact match on the barcode field.
  fn product_by_barcode<'a>(
    &'a self,
    barcode: &'a str,
  ) -> impl Future<Output = Result<Option<ProductRecord>, Self::Error>> + Send + 'a;

  /// Case-insensitive substring match on the name; the first row in store
  /// order wins when several match.
  fn product_by_name<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Option<ProductRecord>, Self::Error>> + Send + 'a;

  /// Nutrients for a product, in insertion order.
  fn nutrients(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Nutrient>, Self::Error>> + Send + '_;

  fn preservation(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Option<PreservationGuideline>, Self::Error>>
  + Send
  + '_;

  /// Verification records for a product, in insertion order.
  fn verifications(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Vec<VerificationRecord>, Self::Error>>
  + Send
  + '_;
}

/// Change notification capability, one filtered watch per record group.
pub trait ChangeFeed: Send + Sync {
  fn watch(&self, group: RecordGroup, product_id: Uuid) -> Watch;
}

// ─── Feedback ────────────────────────────────────────────────────────────────

pub trait FeedbackStore: Store {
  /// Persist already-validated feedback. Id and timestamp are set by the
  /// store.
  fn save_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  /// All feedback, newest first.
  fn list_feedback(
    &self,
  ) -> impl Future<Output = Result<Vec<Feedback>, Self::Error>> + Send + '_;
}

// ─── Accounts and sessions ───────────────────────────────────────────────────

pub trait AccountStore: Store {
  /// Persist a new account. Emails are unique: returns `None` without
  /// writing anything if the email is already registered.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<StoredAccount>, Self::Error>> + Send + '_;

  /// Look up an account by its (lower-cased) email.
  fn account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<StoredAccount>, Self::Error>> + Send + 'a;
}

/// Typed persistence for login sessions.
pub trait SessionStore: Store {
  fn save_session<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Returns `None` for unknown or cleared tokens.
  fn load_session(
    &self,
    token: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Returns `true` if a session was removed.
  fn clear_session(
    &self,
    token: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Everything the HTTP layer needs from one backend.
pub trait Backend:
  ProductStore + ChangeFeed + FeedbackStore + AccountStore + SessionStore
{
}

impl<T> Backend for T where
  T: ProductStore + ChangeFeed + FeedbackStore + AccountStore + SessionStore
{
}
