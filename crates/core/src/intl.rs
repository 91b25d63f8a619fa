//! Secondary fact stream: international/wholesale sale lines.

use chrono::{DateTime, Utc};

/// One line of the international sales feed.
///
/// This is a best-effort feed with looser guarantees than the event stream:
/// rows that cannot be fully resolved at load time (blank customer or sku,
/// missing gross amount) are dropped, not quarantined.
#[derive(Debug, Clone, PartialEq)]
pub struct IntlSale {
    pub sale_id: String,
    pub ts: DateTime<Utc>,
    /// `YYYY-MM-DD`; defaults to the date portion of `ts` when absent.
    pub date_key: String,
    pub customer: String,
    pub sku: String,
    pub pcs: i64,
    pub rate: Option<f64>,
    pub gross_amt: Option<f64>,
    pub currency: String,
    pub source_dataset: String,
}
