//! [`SqliteStore`] — the SQLite implementation of the Verdant store traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, functions::FunctionFlags};
use tracing::debug;
use uuid::Uuid;

use verdant_core::{
  account::{Account, NewAccount, Session, StoredAccount},
  change::{ChangeEvent, ChangeHub, ChangeOp, Watch},
  feedback::{Feedback, NewFeedback},
  product::{
    NewProduct, Nutrient, PreservationGuideline, ProductCategory,
    ProductRecord, RecordGroup, VerificationRecord,
  },
  store::{
    AccountStore, ChangeFeed, FeedbackStore, ProductStore, SessionStore, Store,
  },
};

use crate::{
  Error, Result,
  encode::{
    PRODUCT_COLUMNS, RawAccount, RawFeedback, RawNutrient, RawProduct,
    RawSession, RawVerification, encode_date, encode_dt, encode_nutrient_value,
    encode_provenance, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Verdant product store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection and the change hub are both
/// reference-counted, so every clone publishes to the same watchers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  hub:  ChangeHub,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, hub: ChangeHub::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, hub: ChangeHub::default() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        // SQLite's `lower()` and `LIKE` only fold ASCII.
        conn.create_scalar_function(
          "fold_case",
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The hub every write on this store publishes to.
  pub fn hub(&self) -> &ChangeHub { &self.hub }

  async fn product_exists(&self, product_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(product_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM food_items WHERE product_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn require_product(&self, product_id: Uuid) -> Result<()> {
    if self.product_exists(product_id).await? {
      Ok(())
    } else {
      Err(Error::ProductNotFound(product_id))
    }
  }

  /// Fetch a single product with an arbitrary `WHERE` clause over one
  /// parameter.
  async fn product_where(
    &self,
    clause: &'static str,
    param: String,
  ) -> Result<Option<ProductRecord>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PRODUCT_COLUMNS} FROM food_items WHERE {clause} \
           ORDER BY rowid LIMIT 1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![param], RawProduct::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProduct::into_record).transpose()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn add_category(
    &self,
    name: impl Into<String>,
    description: Option<String>,
  ) -> Result<ProductCategory> {
    let name = name.into();
    let (name_c, desc_c) = (name.clone(), description.clone());
    let category_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO food_categories (name, description) VALUES (?1, ?2)",
          rusqlite::params![name_c, desc_c],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(ProductCategory { category_id, name, description })
  }

  /// Insert a product and publish it to product watchers.
  pub async fn add_product(&self, input: NewProduct) -> Result<ProductRecord> {
    let now = Utc::now();
    let record = ProductRecord {
      product_id:          Uuid::new_v4(),
      name:                input.name,
      barcode:             input.barcode,
      brand:               input.brand,
      variety:             input.variety,
      origin:              input.origin,
      ingredients:         input.ingredients,
      season:              input.season,
      growth_conditions:   input.growth_conditions,
      organic_cultivation: input.organic_cultivation,
      is_organic:          input.is_organic,
      category_id:         input.category_id,
      created_at:          now,
      updated_at:          now,
    };

    let row = record.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO food_items ({PRODUCT_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
          ),
          rusqlite::params![
            encode_uuid(row.product_id),
            row.name,
            row.barcode,
            row.brand,
            row.variety,
            row.origin,
            row.ingredients,
            row.season,
            row.growth_conditions,
            row.organic_cultivation,
            row.is_organic,
            row.category_id,
            encode_dt(row.created_at),
            encode_dt(row.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    debug!(product_id = %record.product_id, "product added");
    self
      .hub
      .publish(ChangeEvent::product(ChangeOp::Insert, record.clone()));
    Ok(record)
  }

  /// Replace every editable field of a product, keeping its id and creation
  /// time.
  pub async fn update_product(
    &self,
    product_id: Uuid,
    input: NewProduct,
  ) -> Result<ProductRecord> {
    let existing = self
      .product_where("product_id = ?1", encode_uuid(product_id))
      .await?
      .ok_or(Error::ProductNotFound(product_id))?;

    let record = ProductRecord {
      product_id,
      name: input.name,
      barcode: input.barcode,
      brand: input.brand,
      variety: input.variety,
      origin: input.origin,
      ingredients: input.ingredients,
      season: input.season,
      growth_conditions: input.growth_conditions,
      organic_cultivation: input.organic_cultivation,
      is_organic: input.is_organic,
      category_id: input.category_id,
      created_at: existing.created_at,
      updated_at: Utc::now(),
    };

    let row = record.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE food_items SET
             name = ?2, barcode = ?3, brand = ?4, variety = ?5, origin = ?6,
             ingredients = ?7, season = ?8, growth_conditions = ?9,
             organic_cultivation = ?10, is_organic = ?11, category_id = ?12,
             updated_at = ?13
           WHERE product_id = ?1",
          rusqlite::params![
            encode_uuid(row.product_id),
            row.name,
            row.barcode,
            row.brand,
            row.variety,
            row.origin,
            row.ingredients,
            row.season,
            row.growth_conditions,
            row.organic_cultivation,
            row.is_organic,
            row.category_id,
            encode_dt(row.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    self
      .hub
      .publish(ChangeEvent::product(ChangeOp::Update, record.clone()));
    Ok(record)
  }

  /// Delete a product and its child rows. Returns `false` if it did not
  /// exist.
  pub async fn delete_product(&self, product_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(product_id);
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM food_items WHERE product_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      debug!(%product_id, "product deleted");
      // Child rows went with it through `ON DELETE CASCADE`.
      for group in RecordGroup::ALL {
        self
          .hub
          .publish(ChangeEvent::trigger(group, product_id, ChangeOp::Delete));
      }
    }
    Ok(deleted)
  }

  /// Append a nutrient to a product's list.
  pub async fn add_nutrient(
    &self,
    product_id: Uuid,
    nutrient: Nutrient,
  ) -> Result<()> {
    self.require_product(product_id).await?;

    let id_str = encode_uuid(product_id);
    let value = encode_nutrient_value(&nutrient.value);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO nutrients (product_id, name, value, unit, daily_value_percent)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str,
            nutrient.name,
            value,
            nutrient.unit,
            nutrient.daily_value_percent,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.hub.publish(ChangeEvent::trigger(
      RecordGroup::Nutrients,
      product_id,
      ChangeOp::Insert,
    ));
    Ok(())
  }

  /// Insert or replace the product's preservation guideline.
  pub async fn set_preservation(
    &self,
    product_id: Uuid,
    guideline: PreservationGuideline,
  ) -> Result<()> {
    self.require_product(product_id).await?;

    let id_str = encode_uuid(product_id);
    let replaced = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let replaced = tx
          .query_row(
            "SELECT 1 FROM preservation_guidelines WHERE product_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        tx.execute(
          "INSERT INTO preservation_guidelines (
             product_id, refrigerated_duration, room_temp_duration,
             storage_method, tips
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(product_id) DO UPDATE SET
             refrigerated_duration = excluded.refrigerated_duration,
             room_temp_duration    = excluded.room_temp_duration,
             storage_method        = excluded.storage_method,
             tips                  = excluded.tips",
          rusqlite::params![
            id_str,
            guideline.refrigerated_duration,
            guideline.room_temp_duration,
            guideline.storage_method,
            guideline.tips,
          ],
        )?;
        tx.commit()?;
        Ok(replaced)
      })
      .await?;

    let op = if replaced { ChangeOp::Update } else { ChangeOp::Insert };
    self
      .hub
      .publish(ChangeEvent::trigger(RecordGroup::Preservation, product_id, op));
    Ok(())
  }

  /// Record one certification body's verdict on a product. The body is
  /// registered on first use; a second verdict from the same body replaces
  /// the first in place.
  pub async fn record_verification(
    &self,
    product_id: Uuid,
    record: VerificationRecord,
  ) -> Result<()> {
    self.require_product(product_id).await?;

    let id_str = encode_uuid(product_id);
    let date = record.certification_date.map(encode_date);
    let provenance = encode_provenance(record.provenance);
    let replaced = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO certification_sources (name) VALUES (?1)
           ON CONFLICT(name) DO NOTHING",
          rusqlite::params![record.source_name],
        )?;
        let source_id: i64 = tx.query_row(
          "SELECT source_id FROM certification_sources WHERE name = ?1",
          rusqlite::params![record.source_name],
          |r| r.get(0),
        )?;

        let updated = tx.execute(
          "UPDATE organic_verifications SET
             is_verified = ?3, certification_id = ?4, certification_date = ?5,
             notes = ?6, provenance = ?7
           WHERE product_id = ?1 AND source_id = ?2",
          rusqlite::params![
            id_str,
            source_id,
            record.verified,
            record.certification_id,
            date,
            record.notes,
            provenance,
          ],
        )?;
        if updated == 0 {
          tx.execute(
            "INSERT INTO organic_verifications (
               product_id, source_id, is_verified, certification_id,
               certification_date, notes, provenance
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              id_str,
              source_id,
              record.verified,
              record.certification_id,
              date,
              record.notes,
              provenance,
            ],
          )?;
        }
        tx.commit()?;
        Ok(updated > 0)
      })
      .await?;

    let op = if replaced { ChangeOp::Update } else { ChangeOp::Insert };
    self.hub.publish(ChangeEvent::trigger(
      RecordGroup::Verifications,
      product_id,
      op,
    ));
    Ok(())
  }
}

/// Escape `LIKE` wildcards so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
  let mut pattern = String::with_capacity(fragment.len() + 2);
  pattern.push('%');
  for c in fragment.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Store trait impls ───────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;
}

impl ProductStore for SqliteStore {
  async fn product(&self, product_id: Uuid) -> Result<Option<ProductRecord>> {
    self.product_where("product_id = ?1", encode_uuid(product_id)).await
  }

  async fn product_by_barcode<'a>(
    &'a self,
    barcode: &'a str,
  ) -> Result<Option<ProductRecord>> {
    self.product_where("barcode = ?1", barcode.to_owned()).await
  }

  async fn product_by_name<'a>(
    &'a self,
    fragment: &'a str,
  ) -> Result<Option<ProductRecord>> {
    self
      .product_where(
        "fold_case(name) LIKE ?1 ESCAPE '\\'",
        like_pattern(&fragment.to_lowercase()),
      )
      .await
  }

  async fn nutrients(&self, product_id: Uuid) -> Result<Vec<Nutrient>> {
    let id_str = encode_uuid(product_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name, value, unit, daily_value_percent FROM nutrients
           WHERE product_id = ?1 ORDER BY nutrient_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawNutrient {
              name:                row.get(0)?,
              value:               row.get(1)?,
              unit:                row.get(2)?,
              daily_value_percent: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawNutrient::into_nutrient).collect())
  }

  async fn preservation(
    &self,
    product_id: Uuid,
  ) -> Result<Option<PreservationGuideline>> {
    let id_str = encode_uuid(product_id);
    let guideline = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT refrigerated_duration, room_temp_duration,
                      storage_method, tips
               FROM preservation_guidelines WHERE product_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(PreservationGuideline {
                  refrigerated_duration: row.get(0)?,
                  room_temp_duration:    row.get(1)?,
                  storage_method:        row.get(2)?,
                  tips:                  row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(guideline)
  }

  async fn verifications(
    &self,
    product_id: Uuid,
  ) -> Result<Vec<VerificationRecord>> {
    let id_str = encode_uuid(product_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.name, v.is_verified, v.certification_id,
                  v.certification_date, v.notes, v.provenance
           FROM organic_verifications v
           JOIN certification_sources s ON s.source_id = v.source_id
           WHERE v.product_id = ?1
           ORDER BY v.verification_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawVerification {
              source_name:        row.get(0)?,
              verified:           row.get(1)?,
              certification_id:   row.get(2)?,
              certification_date: row.get(3)?,
              notes:              row.get(4)?,
              provenance:         row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawVerification::into_record).collect()
  }
}

impl ChangeFeed for SqliteStore {
  fn watch(&self, group: RecordGroup, product_id: Uuid) -> Watch {
    self.hub.watch(group, product_id)
  }
}

impl FeedbackStore for SqliteStore {
  async fn save_feedback(&self, input: NewFeedback) -> Result<Feedback> {
    let feedback = Feedback {
      feedback_id: Uuid::new_v4(),
      name:        input.name,
      email:       input.email,
      rating:      input.rating,
      category:    input.category,
      message:     input.message,
      created_at:  Utc::now(),
    };

    let row = feedback.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedback (
             feedback_id, name, email, rating, category, message, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(row.feedback_id),
            row.name,
            row.email,
            row.rating,
            row.category.to_string(),
            row.message,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(feedback)
  }

  async fn list_feedback(&self) -> Result<Vec<Feedback>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT feedback_id, name, email, rating, category, message, created_at
           FROM feedback ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawFeedback {
              feedback_id: row.get(0)?,
              name:        row.get(1)?,
              email:       row.get(2)?,
              rating:      row.get(3)?,
              category:    row.get(4)?,
              message:     row.get(5)?,
              created_at:  row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawFeedback::into_feedback).collect()
  }
}

impl AccountStore for SqliteStore {
  async fn create_account(&self, input: NewAccount) -> Result<Option<StoredAccount>> {
    let stored = StoredAccount {
      account:       Account {
        account_id: Uuid::new_v4(),
        email:      input.email,
        name:       input.name,
        created_at: Utc::now(),
      },
      password_hash: input.password_hash,
    };

    let row = stored.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO accounts (account_id, email, name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(email) DO NOTHING",
          rusqlite::params![
            encode_uuid(row.account.account_id),
            row.account.email,
            row.account.name,
            row.password_hash,
            encode_dt(row.account.created_at),
          ],
        )?;
        Ok(n > 0)
      })
      .await?;

    if !inserted {
      debug!(email = %stored.account.email, "email already registered");
      return Ok(None);
    }
    Ok(Some(stored))
  }

  async fn account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> Result<Option<StoredAccount>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, email, name, password_hash, created_at
               FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawAccount {
                  account_id:    row.get(0)?,
                  email:         row.get(1)?,
                  name:          row.get(2)?,
                  password_hash: row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAccount::into_stored).transpose()
  }
}

impl SessionStore for SqliteStore {
  async fn save_session<'a>(&'a self, session: &'a Session) -> Result<()> {
    let token = encode_uuid(session.token);
    let account_id = encode_uuid(session.account.account_id);
    let started_at = encode_dt(session.started_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, account_id, started_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token, account_id, started_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_session(&self, token: Uuid) -> Result<Option<Session>> {
    let token_str = encode_uuid(token);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT s.token, s.started_at,
                      a.account_id, a.email, a.name, a.password_hash, a.created_at
               FROM sessions s
               JOIN accounts a ON a.account_id = s.account_id
               WHERE s.token = ?1",
              rusqlite::params![token_str],
              |row| {
                Ok(RawSession {
                  token:      row.get(0)?,
                  started_at: row.get(1)?,
                  account:    RawAccount {
                    account_id:    row.get(2)?,
                    email:         row.get(3)?,
                    name:          row.get(4)?,
                    password_hash: row.get(5)?,
                    created_at:    row.get(6)?,
                  },
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn clear_session(&self, token: Uuid) -> Result<bool> {
    let token_str = encode_uuid(token);
    let cleared = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM sessions WHERE token = ?1",
          rusqlite::params![token_str],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(cleared)
  }
}
