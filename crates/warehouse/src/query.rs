//! Daily analytics queries over the star schema.
//!
//! Read-only convenience queries consumed by the reporting glue: DAU,
//! revenue, event mix, and the signup→purchase funnel.

use rusqlite::Row;

use pipeline_core::{Error, Result};

use crate::store::Warehouse;

/// Daily active users: distinct non-null users per day.
#[derive(Debug, Clone, PartialEq)]
pub struct DauRow {
    pub event_date: String,
    pub dau: i64,
}

/// Revenue per day over purchase events.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRow {
    pub event_date: String,
    pub revenue: f64,
}

/// Event volume by canonical kind per day.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCountRow {
    pub event_date: String,
    pub event: String,
    pub events: i64,
}

/// Same-day signup→purchase funnel.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelRow {
    pub event_date: String,
    pub signup_users: i64,
    pub purchasers: i64,
    pub signup_to_purchase_rate: f64,
}

fn fetch_all<T>(wh: &Warehouse, sql: &str, map: fn(&Row<'_>) -> rusqlite::Result<T>) -> Result<Vec<T>> {
    let mut stmt = wh
        .conn()
        .prepare(sql)
        .map_err(|e| Error::storage(format!("prepare query: {e}")))?;
    let rows = stmt
        .query_map([], map)
        .map_err(|e| Error::storage(format!("run query: {e}")))?;
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(|e| Error::storage(format!("read query row: {e}")))
}

/// Daily active users. NULL users are excluded from DAU.
pub fn query_dau(wh: &Warehouse) -> Result<Vec<DauRow>> {
    fetch_all(
        wh,
        "SELECT event_date, COUNT(DISTINCT user_id) AS dau
         FROM fact_events
         WHERE user_id IS NOT NULL
         GROUP BY event_date
         ORDER BY event_date",
        |row| {
            Ok(DauRow {
                event_date: row.get(0)?,
                dau: row.get(1)?,
            })
        },
    )
}

/// Revenue: sum(amount) per day for purchase events only.
pub fn query_revenue(wh: &Warehouse) -> Result<Vec<RevenueRow>> {
    fetch_all(
        wh,
        "SELECT f.event_date, ROUND(SUM(COALESCE(f.amount, 0)), 2) AS revenue
         FROM fact_events f
         JOIN dim_event_types e ON e.event_type_id = f.event_type_id
         WHERE e.event = 'purchase'
         GROUP BY f.event_date
         ORDER BY f.event_date",
        |row| {
            Ok(RevenueRow {
                event_date: row.get(0)?,
                revenue: row.get(1)?,
            })
        },
    )
}

/// Event volume by kind per day. Good for sanity-checking traffic mix.
pub fn query_event_counts(wh: &Warehouse) -> Result<Vec<EventCountRow>> {
    fetch_all(
        wh,
        "SELECT f.event_date, e.event, COUNT(*) AS events
         FROM fact_events f
         JOIN dim_event_types e ON e.event_type_id = f.event_type_id
         GROUP BY f.event_date, e.event
         ORDER BY f.event_date, e.event",
        |row| {
            Ok(EventCountRow {
                event_date: row.get(0)?,
                event: row.get(1)?,
                events: row.get(2)?,
            })
        },
    )
}

/// Same-day funnel: distinct signup users, distinct purchasers, and the
/// purchase rate (0 when there were no signups).
pub fn query_funnel(wh: &Warehouse) -> Result<Vec<FunnelRow>> {
    fetch_all(
        wh,
        "WITH daily AS (
           SELECT
             f.event_date,
             COUNT(DISTINCT CASE WHEN e.event = 'signup' THEN f.user_id END) AS signup_users,
             COUNT(DISTINCT CASE WHEN e.event = 'purchase' THEN f.user_id END) AS purchasers
           FROM fact_events f
           JOIN dim_event_types e ON e.event_type_id = f.event_type_id
           WHERE f.user_id IS NOT NULL
           GROUP BY f.event_date
         )
         SELECT
           event_date,
           signup_users,
           purchasers,
           CASE
             WHEN signup_users = 0 THEN 0.0
             ELSE ROUND(1.0 * purchasers / signup_users, 4)
           END AS signup_to_purchase_rate
         FROM daily
         ORDER BY event_date",
        |row| {
            Ok(FunnelRow {
                event_date: row.get(0)?,
                signup_users: row.get(1)?,
                purchasers: row.get(2)?,
                signup_to_purchase_rate: row.get(3)?,
            })
        },
    )
}

/// Total fact rows; verification helper for tests and the run summary.
pub fn count_fact_events(wh: &Warehouse) -> Result<i64> {
    wh.conn()
        .query_row("SELECT COUNT(*) FROM fact_events", [], |row| row.get(0))
        .map_err(|e| Error::storage(format!("count fact_events: {e}")))
}
