//! Demo catalogue: the four packaged products the scanner demo cycles
//! through, plus a handful of fresh produce items looked up by name.
//!
//! Seeding is idempotent; products whose barcode or name is already present
//! are skipped.

use chrono::NaiveDate;
use tracing::{debug, info};
use verdant_core::{
  product::{
    NewProduct, Nutrient, NutrientValue, PreservationGuideline,
    VerificationRecord,
  },
  store::ProductStore,
};
use verdant_store_sqlite::{Result, SqliteStore};

/// Barcodes the scanner demo picks from.
pub const DEMO_BARCODES: [&str; 4] =
  ["8901063152227", "5000112637922", "8901719110018", "8902080527022"];

struct Item {
  name:          &'static str,
  barcode:       Option<&'static str>,
  brand:         Option<&'static str>,
  category:      &'static str,
  is_organic:    bool,
  season:        Option<&'static str>,
  /// `(name, value, unit, daily value %)`
  nutrients:     &'static [(&'static str, &'static str, Option<&'static str>, Option<f64>)],
  /// `(refrigerated, room temperature, method, tips)`
  preservation:  Option<(&'static str, &'static str, &'static str, &'static str)>,
  /// `(source, verified, certification id)`
  verifications: &'static [(&'static str, bool, Option<&'static str>)],
}

const CATALOGUE: &[Item] = &[
  Item {
    name:          "Organic Basmati Rice",
    barcode:       Some("8901063152227"),
    brand:         Some("Himalayan Fields"),
    category:      "Grains",
    is_organic:    true,
    season:        None,
    nutrients:     &[
      ("Calories", "356", Some("kcal"), None),
      ("Carbohydrates", "78", Some("g"), Some(26.0)),
      ("Protein", "8.1", Some("g"), Some(16.0)),
    ],
    preservation:  Some((
      "Not required",
      "12 months sealed",
      "Airtight container in a cool, dry place",
      "Keep away from moisture to prevent weevils",
    )),
    verifications: &[
      ("USDA Organic", true, Some("USDA-88121")),
      ("EU Organic", true, Some("EU-ORG-4471")),
      ("India Organic (NPOP)", false, None),
    ],
  },
  Item {
    name:          "Organic Rolled Oats",
    barcode:       Some("5000112637922"),
    brand:         Some("Greenacre Mills"),
    category:      "Grains",
    is_organic:    true,
    season:        None,
    nutrients:     &[
      ("Calories", "379", Some("kcal"), None),
      ("Dietary Fiber", "10", Some("g"), Some(36.0)),
    ],
    preservation:  None,
    verifications: &[
      ("Soil Association", true, Some("SA-20931")),
      ("EU Organic", true, Some("EU-ORG-1187")),
      ("Ecocert", true, None),
    ],
  },
  Item {
    name:          "Masala Instant Noodles",
    barcode:       Some("8901719110018"),
    brand:         Some("QuickBite"),
    category:      "Packaged Foods",
    is_organic:    false,
    season:        None,
    nutrients:     &[
      ("Sodium", "1120", Some("mg"), Some(49.0)),
      ("Preservatives", "Present", None, None),
    ],
    preservation:  None,
    verifications: &[
      ("USDA Organic", false, None),
      ("EU Organic", false, None),
      ("India Organic (NPOP)", false, None),
    ],
  },
  Item {
    name:          "Organic Green Tea",
    barcode:       Some("8902080527022"),
    brand:         Some("Assam Valley"),
    category:      "Beverages",
    is_organic:    true,
    season:        None,
    nutrients:     &[("Antioxidants", "High", None, None)],
    preservation:  Some((
      "Not recommended",
      "6 months once opened",
      "Opaque tin away from light",
      "Reseal tightly after each use",
    )),
    verifications: &[],
  },
  Item {
    name:          "Organic Apple",
    barcode:       None,
    brand:         None,
    category:      "Fruits",
    is_organic:    true,
    season:        Some("Autumn"),
    nutrients:     &[
      ("Calories", "52", Some("kcal"), None),
      ("Dietary Fiber", "2.4", Some("g"), Some(9.0)),
      ("Vitamin C", "4.6", Some("mg"), Some(8.0)),
    ],
    preservation:  Some((
      "4-6 weeks",
      "5-7 days",
      "Crisper drawer in a perforated bag",
      "Store apart from other produce; apples release ethylene",
    )),
    verifications: &[
      ("USDA Organic", true, Some("USDA-55012")),
      ("EU Organic", true, None),
    ],
  },
  Item {
    name:          "Spinach",
    barcode:       None,
    brand:         None,
    category:      "Vegetables",
    is_organic:    false,
    season:        Some("Spring"),
    nutrients:     &[
      ("Iron", "2.7", Some("mg"), Some(15.0)),
      ("Vitamin K", "483", Some("mcg"), Some(402.0)),
    ],
    preservation:  Some((
      "5-7 days",
      "Same day",
      "Wrapped in paper towel inside a sealed container",
      "Wash just before eating",
    )),
    verifications: &[("India Organic (NPOP)", false, None)],
  },
  Item {
    name:          "Tomato",
    barcode:       None,
    brand:         None,
    category:      "Vegetables",
    is_organic:    true,
    season:        Some("Summer"),
    nutrients:     &[
      ("Vitamin C", "14", Some("mg"), Some(15.0)),
      ("Lycopene", "High", None, None),
    ],
    preservation:  Some((
      "Only once fully ripe",
      "3-5 days",
      "Stem side down, out of direct sunlight",
      "Refrigeration dulls flavour",
    )),
    verifications: &[
      ("Ecocert", true, None),
      ("EU Organic", false, None),
    ],
  },
  Item {
    name:          "Carrots",
    barcode:       None,
    brand:         None,
    category:      "Vegetables",
    is_organic:    true,
    season:        Some("Winter"),
    nutrients:     &[
      ("Vitamin A", "835", Some("mcg"), Some(93.0)),
      ("Dietary Fiber", "2.8", Some("g"), Some(10.0)),
    ],
    preservation:  Some((
      "3-4 weeks",
      "3-5 days",
      "Tops removed, sealed bag in the crisper",
      "Keep away from apples and pears",
    )),
    verifications: &[
      ("Soil Association", true, Some("SA-77310")),
      ("USDA Organic", true, None),
      ("EU Organic", true, None),
    ],
  },
];

/// Populate `store` with the demo catalogue. Returns how many products were
/// added.
pub async fn seed(store: &SqliteStore) -> Result<usize> {
  let certified_on = NaiveDate::from_ymd_opt(2024, 3, 15);
  let mut categories = Vec::<(&str, i64)>::new();
  let mut added = 0;

  for item in CATALOGUE {
    let existing = match item.barcode {
      Some(code) => store.product_by_barcode(code).await?,
      None => store.product_by_name(item.name).await?,
    };
    if existing.is_some() {
      debug!(name = item.name, "demo product already present");
      continue;
    }

    let category_id = match categories.iter().find(|(n, _)| *n == item.category) {
      Some((_, id)) => *id,
      None => {
        let id = store.add_category(item.category, None).await?.category_id;
        categories.push((item.category, id));
        id
      }
    };

    let product = store
      .add_product(NewProduct {
        name: item.name.into(),
        barcode: item.barcode.map(Into::into),
        brand: item.brand.map(Into::into),
        season: item.season.map(Into::into),
        is_organic: item.is_organic,
        category_id: Some(category_id),
        ..NewProduct::default()
      })
      .await?;

    for (name, value, unit, dv) in item.nutrients {
      store
        .add_nutrient(product.product_id, Nutrient {
          name:                (*name).into(),
          value:               NutrientValue::parse(value),
          unit:                unit.map(Into::into),
          daily_value_percent: *dv,
        })
        .await?;
    }

    if let Some((fridge, room, method, tips)) = item.preservation {
      store
        .set_preservation(product.product_id, PreservationGuideline {
          refrigerated_duration: fridge.into(),
          room_temp_duration:    room.into(),
          storage_method:        method.into(),
          tips:                  tips.into(),
        })
        .await?;
    }

    for (source, verified, cert_id) in item.verifications {
      let mut record = VerificationRecord::new(*source, *verified);
      if let Some(id) = cert_id {
        record.certification_id = Some((*id).into());
        record.certification_date = certified_on;
      }
      store.record_verification(product.product_id, record).await?;
    }

    added += 1;
  }

  info!(added, "demo catalogue seeded");
  Ok(added)
}
