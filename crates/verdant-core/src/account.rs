//! Accounts and login sessions.
//!
//! Passwords are hashed with argon2 before they reach a store. A session is
//! an opaque bearer token bound to an account; it lives until logout.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  store::{AccountStore, SessionStore},
  validation::{ValidationError, check_length, is_valid_email},
};

pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id: Uuid,
  pub email:      String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// An account row together with its PHC password hash. Never serialised to
/// clients.
#[derive(Debug, Clone)]
pub struct StoredAccount {
  pub account:       Account,
  pub password_hash: String,
}

/// Input to [`AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token:      Uuid,
  pub account:    Account,
  pub started_at: DateTime<Utc>,
}

impl Session {
  fn start(account: Account) -> Self {
    Self { token: Uuid::new_v4(), account, started_at: Utc::now() }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub email:    String,
  pub password: String,
  pub name:     String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

impl Registration {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if !is_valid_email(self.email.trim()) {
      return Err(ValidationError::new(
        "email",
        "please enter a valid email address",
      ));
    }
    check_length("name", self.name.trim(), 1, None)?;
    check_length("password", &self.password, MIN_PASSWORD_LEN, None)
  }
}

// ─── Password hashing ────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Registration, login and session lifecycle over one backend.
pub struct Accounts<S> {
  store: Arc<S>,
}

impl<S> Clone for Accounts<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S> Accounts<S>
where
  S: AccountStore + SessionStore,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Create an account and log it in.
  pub async fn register(&self, input: Registration) -> Result<Session> {
    input.validate()?;
    let email = normalize_email(&input.email);

    let stored = self
      .store
      .create_account(NewAccount {
        email:         email.clone(),
        name:          input.name.trim().to_owned(),
        password_hash: hash_password(&input.password)?,
      })
      .await
      .map_err(Error::store)?
      .ok_or(Error::AccountExists(email))?;

    info!(account_id = %stored.account.account_id, "account registered");
    self.open_session(stored.account).await
  }

  pub async fn login(&self, input: Credentials) -> Result<Session> {
    let email = normalize_email(&input.email);
    let stored = self
      .store
      .account_by_email(&email)
      .await
      .map_err(Error::store)?
      .ok_or(Error::InvalidCredentials)?;

    if !verify_password(&input.password, &stored.password_hash) {
      debug!(account_id = %stored.account.account_id, "password mismatch");
      return Err(Error::InvalidCredentials);
    }
    self.open_session(stored.account).await
  }

  /// End a session. Returns `false` if the token was already gone.
  pub async fn logout(&self, token: Uuid) -> Result<bool> {
    let cleared = self
      .store
      .clear_session(token)
      .await
      .map_err(Error::store)?;
    debug!(%token, cleared, "logout");
    Ok(cleared)
  }

  pub async fn session(&self, token: Uuid) -> Result<Option<Session>> {
    self.store.load_session(token).await.map_err(Error::store)
  }

  async fn open_session(&self, account: Account) -> Result<Session> {
    let session = Session::start(account);
    self
      .store
      .save_session(&session)
      .await
      .map_err(Error::store)?;
    info!(account_id = %session.account.account_id, "session started");
    Ok(session)
  }
}
