//! Idempotent dimension and fact upserts.
//!
//! Operations run in foreign-key-dependency order: event-type and date
//! dimensions, then users, then fact rows with ids resolved by re-reading
//! the dimension. Each batch is one transaction; a failure rolls the whole
//! batch back so a later step never sees a half-populated dimension.
//!
//! Conflict policy per table:
//! - `dim_event_types`, `dim_dates`, `dim_customers`, `dim_products`:
//!   insert-if-absent (surrogate ids stay stable across runs)
//! - `dim_users`: insert-or-update, last write wins
//! - `fact_events`, `fact_international_sales`: overwrite non-key fields

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rusqlite::params;
use tracing::{debug, info};

use pipeline_core::users::UNKNOWN;
use pipeline_core::{CleanEvent, Error, IntlSale, Result};

use crate::store::Warehouse;

/// Insert event kinds observed in the batch that are not yet present.
/// Existing rows are never touched.
pub fn upsert_dim_event_types(wh: &Warehouse, events: &[CleanEvent]) -> Result<usize> {
    let kinds: BTreeSet<&str> = events.iter().map(|e| e.event.as_str()).collect();
    if kinds.is_empty() {
        return Ok(0);
    }

    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin dim_event_types: {e}")))?;
    {
        let mut stmt = tx
            .prepare("INSERT OR IGNORE INTO dim_event_types(event) VALUES (?1)")
            .map_err(|e| Error::storage(format!("prepare dim_event_types: {e}")))?;
        for kind in &kinds {
            stmt.execute(params![kind])
                .map_err(|e| Error::storage(format!("insert dim_event_types: {e}")))?;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit dim_event_types: {e}")))?;
    Ok(kinds.len())
}

/// Insert calendar dates observed in the batch, decomposed into
/// (year, month, day). Malformed date strings are skipped silently; the
/// enricher derives every `event_date` so none should occur.
pub fn upsert_dim_dates(wh: &Warehouse, events: &[CleanEvent]) -> Result<usize> {
    let dates: BTreeSet<&str> = events.iter().map(|e| e.event_date.as_str()).collect();
    if dates.is_empty() {
        return Ok(0);
    }

    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin dim_dates: {e}")))?;
    let mut staged = 0usize;
    {
        let mut stmt = tx
            .prepare("INSERT OR IGNORE INTO dim_dates(date_key, year, month, day) VALUES (?1, ?2, ?3, ?4)")
            .map_err(|e| Error::storage(format!("prepare dim_dates: {e}")))?;
        for date in &dates {
            let Some((year, month, day)) = split_date_key(date) else {
                continue;
            };
            stmt.execute(params![date, year, month, day])
                .map_err(|e| Error::storage(format!("insert dim_dates: {e}")))?;
            staged += 1;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit dim_dates: {e}")))?;
    Ok(staged)
}

fn split_date_key(date: &str) -> Option<(i64, i64, i64)> {
    let mut parts = date.splitn(3, '-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    Some((year, month, day))
}

/// Upsert the user dimension from the enriched batch.
///
/// Rows without a user id are excluded; null join attributes are stored as
/// the `"unknown"` sentinel. Last value per key wins.
pub fn upsert_dim_users(wh: &Warehouse, events: &[CleanEvent]) -> Result<usize> {
    // BTreeMap keyed on user_id: one row per user, later batch rows win.
    let mut rows: BTreeMap<&str, (&str, &str)> = BTreeMap::new();
    for event in events {
        if let Some(user_id) = event.user_id.as_deref() {
            rows.insert(
                user_id,
                (
                    event.country.as_deref().unwrap_or(UNKNOWN),
                    event.signup_source.as_deref().unwrap_or(UNKNOWN),
                ),
            );
        }
    }
    if rows.is_empty() {
        return Ok(0);
    }

    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin dim_users: {e}")))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO dim_users(user_id, country, signup_source)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                   country = excluded.country,
                   signup_source = excluded.signup_source",
            )
            .map_err(|e| Error::storage(format!("prepare dim_users: {e}")))?;
        for (user_id, (country, signup_source)) in &rows {
            stmt.execute(params![user_id, country, signup_source])
                .map_err(|e| Error::storage(format!("upsert dim_users: {e}")))?;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit dim_users: {e}")))?;
    Ok(rows.len())
}

/// Read the event-kind → surrogate-id lookup back from the dimension.
///
/// Re-reading after the insert guarantees the map covers both newly and
/// previously inserted kinds.
pub fn event_type_id_map(wh: &Warehouse) -> Result<HashMap<String, i64>> {
    read_id_map(wh, "SELECT event, event_type_id FROM dim_event_types")
}

fn read_id_map(wh: &Warehouse, sql: &str) -> Result<HashMap<String, i64>> {
    let mut stmt = wh
        .conn()
        .prepare(sql)
        .map_err(|e| Error::storage(format!("prepare id map: {e}")))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| Error::storage(format!("query id map: {e}")))?;

    let mut map = HashMap::new();
    for row in rows {
        let (key, id) = row.map_err(|e| Error::storage(format!("read id map row: {e}")))?;
        map.insert(key, id);
    }
    Ok(map)
}

/// Upsert the fact table from the enriched batch.
///
/// Ensures the event-type and date dimensions first, resolves foreign keys,
/// then writes all rows in one transaction, overwriting non-key fields on
/// `event_id` conflict.
pub fn upsert_fact_events(wh: &Warehouse, events: &[CleanEvent]) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    upsert_dim_event_types(wh, events)?;
    upsert_dim_dates(wh, events)?;
    let kind_ids = event_type_id_map(wh)?;

    insert_fact_batch(wh, events, &kind_ids)?;

    info!(rows = events.len(), "upserted fact_events");
    Ok(events.len())
}

fn insert_fact_batch(
    wh: &Warehouse,
    events: &[CleanEvent],
    kind_ids: &HashMap<String, i64>,
) -> Result<()> {
    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin fact_events: {e}")))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO fact_events(event_id, ts, user_id, event_type_id, amount, event_date, event_hour)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(event_id) DO UPDATE SET
                   ts = excluded.ts,
                   user_id = excluded.user_id,
                   event_type_id = excluded.event_type_id,
                   amount = excluded.amount,
                   event_date = excluded.event_date,
                   event_hour = excluded.event_hour",
            )
            .map_err(|e| Error::storage(format!("prepare fact_events: {e}")))?;
        for event in events {
            // An unmapped kind after the dimension upsert is a coordination
            // bug, not bad input: abort the run rather than drop the row.
            let event_type_id = kind_ids.get(&event.event).copied().ok_or_else(|| {
                Error::integrity(format!(
                    "event kind {:?} missing from dim_event_types",
                    event.event
                ))
            })?;
            stmt.execute(params![
                event.event_id,
                event.ts.to_rfc3339(),
                event.user_id,
                event_type_id,
                event.amount,
                event.event_date,
                event.event_hour as i64,
            ])
            .map_err(|e| Error::storage(format!("upsert fact_events: {e}")))?;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit fact_events: {e}")))
}

/// Counters from the best-effort international sales load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntlLoadStats {
    pub loaded: usize,
    pub dropped: usize,
}

/// Insert customers observed in the sales batch; blank names are ignored.
pub fn upsert_dim_customers(wh: &Warehouse, sales: &[IntlSale]) -> Result<usize> {
    upsert_name_dim(
        wh,
        "INSERT OR IGNORE INTO dim_customers(customer) VALUES (?1)",
        sales.iter().map(|s| s.customer.as_str()),
    )
}

/// Insert skus observed in the sales batch; blank skus are ignored.
pub fn upsert_dim_products(wh: &Warehouse, sales: &[IntlSale]) -> Result<usize> {
    upsert_name_dim(
        wh,
        "INSERT OR IGNORE INTO dim_products(sku) VALUES (?1)",
        sales.iter().map(|s| s.sku.as_str()),
    )
}

fn upsert_name_dim<'a>(
    wh: &Warehouse,
    sql: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<usize> {
    let names: BTreeSet<&str> = names.filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return Ok(0);
    }

    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin name dim: {e}")))?;
    {
        let mut stmt = tx
            .prepare(sql)
            .map_err(|e| Error::storage(format!("prepare name dim: {e}")))?;
        for name in &names {
            stmt.execute(params![name])
                .map_err(|e| Error::storage(format!("insert name dim: {e}")))?;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit name dim: {e}")))?;
    Ok(names.len())
}

pub fn customer_id_map(wh: &Warehouse) -> Result<HashMap<String, i64>> {
    read_id_map(wh, "SELECT customer, customer_id FROM dim_customers")
}

pub fn product_id_map(wh: &Warehouse) -> Result<HashMap<String, i64>> {
    read_id_map(wh, "SELECT sku, product_id FROM dim_products")
}

/// Upsert the international sales fact stream.
///
/// Best-effort semantics: rows with an unresolvable customer or product, or
/// without a gross amount, are dropped (counted, not quarantined).
pub fn upsert_fact_international_sales(wh: &Warehouse, sales: &[IntlSale]) -> Result<IntlLoadStats> {
    if sales.is_empty() {
        return Ok(IntlLoadStats::default());
    }

    upsert_dim_customers(wh, sales)?;
    upsert_dim_products(wh, sales)?;
    let customer_ids = customer_id_map(wh)?;
    let product_ids = product_id_map(wh)?;

    let tx = wh
        .conn()
        .unchecked_transaction()
        .map_err(|e| Error::storage(format!("begin fact_international_sales: {e}")))?;
    let mut stats = IntlLoadStats::default();
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO fact_international_sales(
                   sale_id, ts, date_key, customer_id, product_id,
                   pcs, rate, gross_amt, currency, source_dataset)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(sale_id) DO UPDATE SET
                   ts = excluded.ts,
                   date_key = excluded.date_key,
                   customer_id = excluded.customer_id,
                   product_id = excluded.product_id,
                   pcs = excluded.pcs,
                   rate = excluded.rate,
                   gross_amt = excluded.gross_amt,
                   currency = excluded.currency,
                   source_dataset = excluded.source_dataset",
            )
            .map_err(|e| Error::storage(format!("prepare fact_international_sales: {e}")))?;
        for sale in sales {
            let resolved = (
                customer_ids.get(&sale.customer),
                product_ids.get(&sale.sku),
                sale.gross_amt,
            );
            let (Some(&customer_id), Some(&product_id), Some(gross_amt)) = resolved else {
                stats.dropped += 1;
                continue;
            };
            stmt.execute(params![
                sale.sale_id,
                sale.ts.to_rfc3339(),
                sale.date_key,
                customer_id,
                product_id,
                sale.pcs,
                sale.rate,
                gross_amt,
                sale.currency,
                sale.source_dataset,
            ])
            .map_err(|e| Error::storage(format!("upsert fact_international_sales: {e}")))?;
            stats.loaded += 1;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage(format!("commit fact_international_sales: {e}")))?;

    if stats.dropped > 0 {
        debug!(dropped = stats.dropped, "dropped incomplete international sale rows");
    }
    info!(rows = stats.loaded, "upserted fact_international_sales");
    Ok(stats)
}
