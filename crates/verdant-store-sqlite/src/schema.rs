//! SQL schema for the Verdant SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS food_categories (
    category_id INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS certification_sources (
    source_id   INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    website     TEXT
);

-- Row order (rowid) is the store order used to break ties in name search.
CREATE TABLE IF NOT EXISTS food_items (
    product_id          TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    barcode             TEXT UNIQUE,
    brand               TEXT,
    variety             TEXT,
    origin              TEXT,
    ingredients         TEXT,
    season              TEXT,
    growth_conditions   TEXT,
    organic_cultivation TEXT,
    is_organic          INTEGER NOT NULL DEFAULT 0,
    category_id         INTEGER REFERENCES food_categories(category_id),
    created_at          TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nutrients (
    nutrient_id         INTEGER PRIMARY KEY,
    product_id          TEXT NOT NULL REFERENCES food_items(product_id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    value               TEXT NOT NULL,   -- number or qualitative level
    unit                TEXT,
    daily_value_percent REAL
);

-- At most one guideline per product.
CREATE TABLE IF NOT EXISTS preservation_guidelines (
    product_id            TEXT PRIMARY KEY REFERENCES food_items(product_id) ON DELETE CASCADE,
    refrigerated_duration TEXT NOT NULL,
    room_temp_duration    TEXT NOT NULL,
    storage_method        TEXT NOT NULL,
    tips                  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organic_verifications (
    verification_id    INTEGER PRIMARY KEY,
    product_id         TEXT NOT NULL REFERENCES food_items(product_id) ON DELETE CASCADE,
    source_id          INTEGER NOT NULL REFERENCES certification_sources(source_id),
    is_verified        INTEGER NOT NULL,
    certification_id   TEXT,
    certification_date TEXT,             -- YYYY-MM-DD
    notes              TEXT,
    provenance         TEXT NOT NULL DEFAULT 'real'
);

CREATE TABLE IF NOT EXISTS feedback (
    feedback_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    category    TEXT NOT NULL,
    message     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    started_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS nutrients_product_idx     ON nutrients(product_id);
CREATE INDEX IF NOT EXISTS verifications_product_idx ON organic_verifications(product_id);
CREATE INDEX IF NOT EXISTS feedback_created_idx      ON feedback(created_at);

PRAGMA user_version = 1;
";
