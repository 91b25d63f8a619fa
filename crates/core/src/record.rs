//! Event record types and schema normalization.
//!
//! Raw JSONL objects are loosely typed: ids may arrive as numbers, amounts
//! as strings, user ids as anything. [`EventRecord::from_object`] is the
//! single place that turns a decoded object into a uniformly typed record;
//! everything downstream works on typed data only.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::quarantine::RejectReason;
use crate::timestamp;

/// Fields that must be present (and non-null) on every raw event.
pub const REQUIRED_FIELDS: &[&str] = &["event", "event_id", "ts"];

/// A validated, uniformly typed event record.
///
/// `event` still carries the raw label at this point; canonicalization and
/// allow-list enforcement happen in the transform stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: String,
    pub ts: DateTime<Utc>,
    pub user_id: Option<String>,
    pub event: String,
    pub amount: Option<f64>,
}

impl EventRecord {
    /// Validate and type a decoded JSON object.
    ///
    /// Checks required-field presence (JSON `null` counts as absent), then
    /// coerces `ts` to a UTC instant. Free-form passthrough attributes are
    /// accepted and dropped; the star schema has no columns for them.
    pub fn from_object(obj: &Map<String, Value>) -> Result<Self, RejectReason> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| obj.get(**f).map_or(true, Value::is_null))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RejectReason::missing_fields(missing));
        }

        let ts = match obj.get("ts") {
            Some(Value::String(raw)) => timestamp::parse_utc(raw),
            _ => None,
        }
        .ok_or(RejectReason::InvalidTimestamp)?;

        Ok(Self {
            event_id: scalar_to_string(&obj["event_id"]).unwrap_or_default(),
            ts,
            user_id: obj.get("user_id").and_then(scalar_to_string),
            event: scalar_to_string(&obj["event"]).unwrap_or_default(),
            amount: obj.get("amount").and_then(coerce_amount),
        })
    }
}

/// A fully transformed record, ready for the warehouse.
///
/// `event` is canonical and allow-listed; `event_date` and `event_hour` are
/// derived from `ts` and never supplied by the input. `country` and
/// `signup_source` come from the user-dimension join and stay `None` for
/// absent or unmatched users.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanEvent {
    pub event_id: String,
    pub ts: DateTime<Utc>,
    pub user_id: Option<String>,
    pub event: String,
    pub amount: Option<f64>,
    pub event_date: String,
    pub event_hour: u32,
    pub country: Option<String>,
    pub signup_source: Option<String>,
}

/// Coerce a JSON scalar to its string form. Objects, arrays, and nulls
/// have no string form and yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric coercion for `amount`: JSON numbers pass through, numeric
/// strings parse, anything else becomes `None`.
pub fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
