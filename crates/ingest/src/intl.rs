//! Secondary feed: international sales JSONL.
//!
//! Best-effort: rows that do not decode, or that lack a usable `sale_id` or
//! timestamp, are dropped with a counter. There is no quarantine for this
//! stream.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use pipeline_core::record::{coerce_amount, scalar_to_string};
use pipeline_core::timestamp;
use pipeline_core::{IntlSale, Result};

/// Output of the international sales reader.
#[derive(Debug, Default)]
pub struct IntlReadResult {
    pub sales: Vec<IntlSale>,
    pub dropped: u64,
}

/// Read the international sales feed.
pub fn read_intl_jsonl(path: &Path) -> Result<IntlReadResult> {
    let file = File::open(path)?;
    let mut result = IntlReadResult::default();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(line) else {
            result.dropped += 1;
            continue;
        };
        match sale_from_object(&obj) {
            Some(sale) => result.sales.push(sale),
            None => result.dropped += 1,
        }
    }

    if result.dropped > 0 {
        debug!(dropped = result.dropped, "dropped unusable international sale rows");
    }
    info!(rows = result.sales.len(), "read international sales feed");
    Ok(result)
}

fn sale_from_object(obj: &Map<String, Value>) -> Option<IntlSale> {
    let sale_id = obj.get("sale_id").and_then(scalar_to_string)?;
    if sale_id.trim().is_empty() {
        return None;
    }
    let ts = match obj.get("ts") {
        Some(Value::String(raw)) => timestamp::parse_utc(raw)?,
        _ => return None,
    };

    let text = |key: &str| {
        obj.get(key)
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(IntlSale {
        sale_id,
        ts,
        date_key: text("date_key").unwrap_or_else(|| ts.format("%Y-%m-%d").to_string()),
        customer: text("customer").unwrap_or_default(),
        sku: text("sku").unwrap_or_default(),
        pcs: obj.get("pcs").and_then(coerce_amount).map(|v| v as i64).unwrap_or(0),
        rate: obj.get("rate").and_then(coerce_amount),
        gross_amt: obj.get("gross_amt").and_then(coerce_amount),
        currency: text("currency").unwrap_or_else(|| "USD".to_string()),
        source_dataset: text("source_dataset").unwrap_or_default(),
    })
}
