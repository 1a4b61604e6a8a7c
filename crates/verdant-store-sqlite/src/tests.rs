//! Integration tests for `SqliteStore` against an in-memory database.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use uuid::Uuid;
use verdant_core::{
  account::{Accounts, Credentials, NewAccount, Registration},
  feedback::{FeedbackCategory, NewFeedback, submit},
  lookup::{LookupConfig, ProductLookup, RetryPolicy},
  product::{
    NewProduct, Nutrient, NutrientValue, PreservationGuideline, Provenance,
    VerificationRecord,
  },
  relay::{ProductChange, ProductObserver},
  store::{AccountStore, FeedbackStore, ProductStore, SessionStore},
  verification::{AggregatedStatus, VerificationSummary},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn nutrient(name: &str, value: NutrientValue, unit: Option<&str>) -> Nutrient {
  Nutrient {
    name: name.into(),
    value,
    unit: unit.map(Into::into),
    daily_value_percent: None,
  }
}

fn lookup(s: &SqliteStore) -> ProductLookup<SqliteStore> {
  ProductLookup::new(Arc::new(s.clone()), LookupConfig {
    retry: RetryPolicy::none(),
    ..LookupConfig::default()
  })
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_product() {
  let s = store().await;
  let category = s.add_category("Fruits", None).await.unwrap();

  let mut input = NewProduct::new("Organic Apple").with_barcode("8901063152227");
  input.is_organic = true;
  input.category_id = Some(category.category_id);
  let added = s.add_product(input).await.unwrap();

  let fetched = s.product(added.product_id).await.unwrap().unwrap();
  assert_eq!(fetched, added);
  assert_eq!(fetched.category_id, Some(category.category_id));
}

#[tokio::test]
async fn get_product_missing_returns_none() {
  let s = store().await;
  assert!(s.product(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.product_by_barcode("00000000").await.unwrap().is_none());
}

#[tokio::test]
async fn barcode_match_is_exact() {
  let s = store().await;
  s.add_product(NewProduct::new("Organic Apple").with_barcode("8901063152227"))
    .await
    .unwrap();

  assert!(s.product_by_barcode("8901063152227").await.unwrap().is_some());
  assert!(s.product_by_barcode("890106315222").await.unwrap().is_none());
}

#[tokio::test]
async fn name_search_is_case_insensitive_and_first_wins() {
  let s = store().await;
  let first = s.add_product(NewProduct::new("Organic Red Apple")).await.unwrap();
  s.add_product(NewProduct::new("Green Apple")).await.unwrap();

  let found = s.product_by_name("APPLE").await.unwrap().unwrap();
  assert_eq!(found.product_id, first.product_id);

  let found = s.product_by_name("green ap").await.unwrap().unwrap();
  assert_eq!(found.name, "Green Apple");
}

#[tokio::test]
async fn name_search_folds_non_ascii_case() {
  let s = store().await;
  s.add_product(NewProduct::new("Äpfel aus Südtirol")).await.unwrap();

  let found = s.product_by_name("äpfel").await.unwrap().unwrap();
  assert_eq!(found.name, "Äpfel aus Südtirol");
  assert!(s.product_by_name("SÜDTIROL").await.unwrap().is_some());
}

#[tokio::test]
async fn name_search_treats_wildcards_literally() {
  let s = store().await;
  s.add_product(NewProduct::new("Spinach")).await.unwrap();
  assert!(s.product_by_name("%").await.unwrap().is_none());
  assert!(s.product_by_name("Sp_nach").await.unwrap().is_none());
}

#[tokio::test]
async fn update_keeps_id_and_creation_time() {
  let s = store().await;
  let added = s.add_product(NewProduct::new("Carrots")).await.unwrap();

  let updated = s
    .update_product(added.product_id, NewProduct::new("Organic Carrots"))
    .await
    .unwrap();
  assert_eq!(updated.product_id, added.product_id);
  assert_eq!(updated.created_at, added.created_at);

  let fetched = s.product(added.product_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Organic Carrots");
}

#[tokio::test]
async fn update_missing_product_fails() {
  let s = store().await;
  let err = s
    .update_product(Uuid::new_v4(), NewProduct::new("Ghost"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProductNotFound(_)));
}

#[tokio::test]
async fn delete_cascades_to_child_rows() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Tomato")).await.unwrap();
  s.add_nutrient(p.product_id, nutrient("Vitamin C", NutrientValue::Amount(14.0), Some("mg")))
    .await
    .unwrap();
  s.record_verification(p.product_id, VerificationRecord::new("USDA Organic", true))
    .await
    .unwrap();

  assert!(s.delete_product(p.product_id).await.unwrap());
  assert!(!s.delete_product(p.product_id).await.unwrap());
  assert!(s.nutrients(p.product_id).await.unwrap().is_empty());
  assert!(s.verifications(p.product_id).await.unwrap().is_empty());
}

// ─── Child groups ────────────────────────────────────────────────────────────

#[tokio::test]
async fn nutrients_keep_insertion_order_and_value_form() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Spinach")).await.unwrap();

  s.add_nutrient(p.product_id, nutrient("Iron", NutrientValue::Amount(2.7), Some("mg")))
    .await
    .unwrap();
  s.add_nutrient(p.product_id, nutrient("Antioxidants", NutrientValue::Text("High".into()), None))
    .await
    .unwrap();

  let got = s.nutrients(p.product_id).await.unwrap();
  assert_eq!(got.len(), 2);
  assert_eq!(got[0].name, "Iron");
  assert_eq!(got[0].value, NutrientValue::Amount(2.7));
  assert_eq!(got[1].value, NutrientValue::Text("High".into()));
  assert_eq!(got[1].unit, None);
}

#[tokio::test]
async fn child_writes_require_an_existing_product() {
  let s = store().await;
  let err = s
    .add_nutrient(Uuid::new_v4(), nutrient("Fiber", NutrientValue::Amount(1.0), Some("g")))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProductNotFound(_)));
}

#[tokio::test]
async fn preservation_is_upserted() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Apple")).await.unwrap();
  assert!(s.preservation(p.product_id).await.unwrap().is_none());

  let mut guideline = PreservationGuideline {
    refrigerated_duration: "4-6 weeks".into(),
    room_temp_duration:    "5-7 days".into(),
    storage_method:        "Crisper drawer".into(),
    tips:                  "Keep away from bananas".into(),
  };
  s.set_preservation(p.product_id, guideline.clone()).await.unwrap();

  guideline.tips = "Store unwashed".into();
  s.set_preservation(p.product_id, guideline.clone()).await.unwrap();

  assert_eq!(s.preservation(p.product_id).await.unwrap(), Some(guideline));
}

#[tokio::test]
async fn verification_per_source_is_replaced_in_place() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Apple")).await.unwrap();

  let mut usda = VerificationRecord::new("USDA Organic", false);
  s.record_verification(p.product_id, usda.clone()).await.unwrap();
  s.record_verification(p.product_id, VerificationRecord::new("EU Organic", true))
    .await
    .unwrap();

  usda.verified = true;
  usda.certification_id = Some("USDA-1042".into());
  usda.certification_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
  s.record_verification(p.product_id, usda.clone()).await.unwrap();

  let got = s.verifications(p.product_id).await.unwrap();
  assert_eq!(got.len(), 2);
  assert_eq!(got[0], usda);
  assert_eq!(got[1].source_name, "EU Organic");
}

#[tokio::test]
async fn synthetic_provenance_survives_storage() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Apple")).await.unwrap();
  let mut record = VerificationRecord::new("India Organic", true);
  record.provenance = Provenance::Synthetic;
  s.record_verification(p.product_id, record).await.unwrap();

  let got = s.verifications(p.product_id).await.unwrap();
  assert!(got[0].is_synthetic());
}

// ─── Workflow over SQLite ────────────────────────────────────────────────────

#[tokio::test]
async fn scan_assembles_and_aggregates() {
  let s = store().await;
  let p = s
    .add_product(NewProduct::new("Organic Basmati Rice").with_barcode("8901063152227"))
    .await
    .unwrap();
  for (source, verified) in
    [("USDA Organic", true), ("EU Organic", true), ("India Organic", false)]
  {
    s.record_verification(p.product_id, VerificationRecord::new(source, verified))
      .await
      .unwrap();
  }

  let report = lookup(&s).scan("8901063152227").await.unwrap();
  let detail = report.detail.unwrap();
  assert_eq!(detail.product.product_id, p.product_id);
  assert_eq!(detail.verifications.len(), 3);
  assert_eq!(report.summary.status, AggregatedStatus::Organic);
}

#[tokio::test]
async fn scan_of_unknown_barcode_is_unverified() {
  let s = store().await;
  let report = lookup(&s).scan("5000112637922").await.unwrap();
  assert!(report.detail.is_none());
  assert_eq!(report.summary.status, AggregatedStatus::Unverified);
}

// ─── Relay ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Seen {
  Product(ProductChange),
  Nutrients(usize),
  Verifications(VerificationSummary),
}

struct Recorder(mpsc::UnboundedSender<Seen>);

impl ProductObserver for Recorder {
  fn product_changed(&self, change: ProductChange) {
    self.0.send(Seen::Product(change)).ok();
  }

  fn nutrients_changed(&self, nutrients: Vec<Nutrient>) {
    self.0.send(Seen::Nutrients(nutrients.len())).ok();
  }

  fn verifications_changed(&self, _: Vec<VerificationRecord>, summary: VerificationSummary) {
    self.0.send(Seen::Verifications(summary)).ok();
  }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Seen>) -> Seen {
  tokio::time::timeout(Duration::from_secs(2), rx.recv())
    .await
    .expect("observer was not called in time")
    .expect("observer channel closed")
}

#[tokio::test]
async fn writes_reach_subscribed_observers() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Organic Spinach")).await.unwrap();

  let (tx, mut rx) = mpsc::unbounded_channel();
  let sub = lookup(&s).subscribe(p.product_id, Arc::new(Recorder(tx)));

  s.record_verification(p.product_id, VerificationRecord::new("USDA Organic", true))
    .await
    .unwrap();
  match next(&mut rx).await {
    Seen::Verifications(summary) => {
      assert_eq!(summary.total, 1);
      assert_eq!(summary.status, AggregatedStatus::Organic);
    }
    other => panic!("unexpected callback: {other:?}"),
  }

  s.add_nutrient(p.product_id, nutrient("Iron", NutrientValue::Amount(2.7), Some("mg")))
    .await
    .unwrap();
  assert!(matches!(next(&mut rx).await, Seen::Nutrients(1)));

  assert!(sub.unsubscribe());
  assert!(!sub.unsubscribe());
}

#[tokio::test]
async fn delete_notifies_every_record_group() {
  let s = store().await;
  let p = s.add_product(NewProduct::new("Organic Spinach")).await.unwrap();
  s.add_nutrient(p.product_id, nutrient("Iron", NutrientValue::Amount(2.7), Some("mg")))
    .await
    .unwrap();
  s.record_verification(p.product_id, VerificationRecord::new("USDA Organic", true))
    .await
    .unwrap();

  let (tx, mut rx) = mpsc::unbounded_channel();
  let _sub = lookup(&s).subscribe(p.product_id, Arc::new(Recorder(tx)));
  assert!(s.delete_product(p.product_id).await.unwrap());

  // The groups relay independently, so the three callbacks arrive in any
  // order.
  let (mut deleted, mut nutrients, mut verifications) = (false, false, false);
  for _ in 0..3 {
    match next(&mut rx).await {
      Seen::Product(ProductChange::Deleted(id)) => {
        assert_eq!(id, p.product_id);
        deleted = true;
      }
      Seen::Nutrients(0) => nutrients = true,
      Seen::Verifications(summary) => {
        assert_eq!(summary.total, 0);
        assert_eq!(summary.status, AggregatedStatus::Unverified);
        verifications = true;
      }
      other => panic!("unexpected callback: {other:?}"),
    }
  }
  assert!(deleted && nutrients && verifications);
}

#[tokio::test]
async fn other_products_are_filtered_out() {
  let s = store().await;
  let watched = s.add_product(NewProduct::new("Apple")).await.unwrap();
  let other = s.add_product(NewProduct::new("Tomato")).await.unwrap();

  let (tx, mut rx) = mpsc::unbounded_channel();
  let _sub = lookup(&s).subscribe(watched.product_id, Arc::new(Recorder(tx)));

  s.add_nutrient(other.product_id, nutrient("Lycopene", NutrientValue::Text("High".into()), None))
    .await
    .unwrap();
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(rx.try_recv().is_err());
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_is_listed_newest_first() {
  let s = store().await;
  for name in ["Asha", "Bram"] {
    submit(&s, NewFeedback {
      name:     name.into(),
      email:    format!("{}@example.com", name.to_lowercase()),
      rating:   4,
      category: FeedbackCategory::Product,
      message:  "Scanning worked on the first try.".into(),
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
  }

  let listed = s.list_feedback().await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].name, "Bram");
  assert_eq!(listed[1].category, FeedbackCategory::Product);
}

// ─── Accounts and sessions ───────────────────────────────────────────────────

#[tokio::test]
async fn register_login_logout_roundtrip() {
  let s = Arc::new(store().await);
  let accounts = Accounts::new(Arc::clone(&s));

  let registered = accounts
    .register(Registration {
      email:    "Grower@Example.com".into(),
      password: "compost42".into(),
      name:     "Grower".into(),
    })
    .await
    .unwrap();
  assert_eq!(registered.account.email, "grower@example.com");

  let session = accounts
    .login(Credentials {
      email:    "grower@example.com".into(),
      password: "compost42".into(),
    })
    .await
    .unwrap();

  let loaded = s.load_session(session.token).await.unwrap().unwrap();
  assert_eq!(loaded.account, session.account);

  assert!(accounts.logout(session.token).await.unwrap());
  assert!(s.load_session(session.token).await.unwrap().is_none());
  assert!(s.load_session(registered.token).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
  let s = Arc::new(store().await);
  let accounts = Accounts::new(s);
  let registration = Registration {
    email:    "grower@example.com".into(),
    password: "compost42".into(),
    name:     "Grower".into(),
  };
  accounts.register(registration.clone()).await.unwrap();
  let err = accounts.register(registration).await.unwrap_err();
  assert!(matches!(err, verdant_core::Error::AccountExists(_)));
}

#[tokio::test]
async fn concurrent_duplicate_registration_is_a_conflict() {
  let s = Arc::new(store().await);
  let accounts = Accounts::new(s);
  let registration = Registration {
    email:    "grower@example.com".into(),
    password: "compost42".into(),
    name:     "Grower".into(),
  };

  let (a, b) = tokio::join!(
    accounts.register(registration.clone()),
    accounts.register(registration),
  );
  let outcomes = [a.is_ok(), b.is_ok()];
  assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "{outcomes:?}");

  let err = [a, b].into_iter().find_map(Result::err).unwrap();
  assert!(matches!(err, verdant_core::Error::AccountExists(ref e) if e == "grower@example.com"));
}

#[tokio::test]
async fn create_account_reports_taken_email() {
  let s = store().await;
  let input = NewAccount {
    email:         "grower@example.com".into(),
    name:          "Grower".into(),
    password_hash: "$argon2id$placeholder".into(),
  };

  let first = s.create_account(input.clone()).await.unwrap();
  assert!(first.is_some());
  assert!(s.create_account(input).await.unwrap().is_none());
}
