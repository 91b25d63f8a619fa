//! Star-schema DDL.
//!
//! Dimensions map natural keys to stable surrogate ids; facts reference
//! them. All statements are idempotent (`IF NOT EXISTS`): the schema is
//! declared once and assumed stable across runs.

use pipeline_core::{Error, Result};

use crate::store::Warehouse;

/// Event-kind dimension; surrogate ids must stay stable across runs, so
/// rows are only ever inserted, never rewritten.
pub const CREATE_DIM_EVENT_TYPES: &str = "
CREATE TABLE IF NOT EXISTS dim_event_types (
  event_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
  event TEXT NOT NULL UNIQUE
);
";

/// Calendar-date dimension keyed on the rendered `YYYY-MM-DD` string.
pub const CREATE_DIM_DATES: &str = "
CREATE TABLE IF NOT EXISTS dim_dates (
  date_key TEXT PRIMARY KEY,
  year INTEGER NOT NULL,
  month INTEGER NOT NULL,
  day INTEGER NOT NULL
);
";

/// User dimension; last write wins per natural key.
pub const CREATE_DIM_USERS: &str = "
CREATE TABLE IF NOT EXISTS dim_users (
  user_id TEXT PRIMARY KEY,
  country TEXT NOT NULL,
  signup_source TEXT NOT NULL
);
";

/// Primary fact table, one row per event; overwritten on conflict.
pub const CREATE_FACT_EVENTS: &str = "
CREATE TABLE IF NOT EXISTS fact_events (
  event_id TEXT PRIMARY KEY,
  ts TEXT NOT NULL,
  user_id TEXT,
  event_type_id INTEGER NOT NULL REFERENCES dim_event_types(event_type_id),
  amount REAL,
  event_date TEXT NOT NULL,
  event_hour INTEGER NOT NULL
);
";

pub const CREATE_DIM_CUSTOMERS: &str = "
CREATE TABLE IF NOT EXISTS dim_customers (
  customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
  customer TEXT NOT NULL UNIQUE
);
";

pub const CREATE_DIM_PRODUCTS: &str = "
CREATE TABLE IF NOT EXISTS dim_products (
  product_id INTEGER PRIMARY KEY AUTOINCREMENT,
  sku TEXT NOT NULL UNIQUE
);
";

/// Secondary fact table for the international sales feed.
pub const CREATE_FACT_INTERNATIONAL_SALES: &str = "
CREATE TABLE IF NOT EXISTS fact_international_sales (
  sale_id TEXT PRIMARY KEY,
  ts TEXT NOT NULL,
  date_key TEXT NOT NULL,
  customer_id INTEGER NOT NULL REFERENCES dim_customers(customer_id),
  product_id INTEGER NOT NULL REFERENCES dim_products(product_id),
  pcs INTEGER NOT NULL,
  rate REAL,
  gross_amt REAL NOT NULL,
  currency TEXT NOT NULL,
  source_dataset TEXT NOT NULL
);
";

/// All table creation statements, dimension tables first.
pub fn all_tables() -> Vec<&'static str> {
    vec![
        CREATE_DIM_EVENT_TYPES,
        CREATE_DIM_DATES,
        CREATE_DIM_USERS,
        CREATE_FACT_EVENTS,
        CREATE_DIM_CUSTOMERS,
        CREATE_DIM_PRODUCTS,
        CREATE_FACT_INTERNATIONAL_SALES,
    ]
}

/// Create the schema if it does not exist.
pub fn init_schema(wh: &Warehouse) -> Result<()> {
    for sql in all_tables() {
        wh.conn()
            .execute_batch(sql)
            .map_err(|e| Error::storage(format!("schema init: {e}")))?;
    }
    Ok(())
}
