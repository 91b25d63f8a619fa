//! Quarantined records and rejection reasons.
//!
//! A quarantined record is an opaque copy of the original input tagged with a
//! machine-readable reason and, where available, the 1-based source line
//! number. Quarantine is terminal: these records never reach the warehouse.

use serde_json::{Map, Value};

/// Why a record was rejected. Rendered reason codes form a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The line was not valid JSON. Carries the parser message.
    JsonDecode(String),
    /// One or more required fields were absent. Carries the sorted names.
    MissingFields(Vec<String>),
    /// The `ts` field did not coerce to a timestamp.
    InvalidTimestamp,
    /// The canonicalized event kind is outside the allowed set.
    InvalidEventType,
}

impl RejectReason {
    /// Missing-fields reason with names sorted for a stable rendering.
    pub fn missing_fields(mut names: Vec<String>) -> Self {
        names.sort();
        Self::MissingFields(names)
    }

    /// The machine-readable reason string written to the quarantine file.
    pub fn code(&self) -> String {
        match self {
            Self::JsonDecode(msg) => format!("json_decode_error={msg}"),
            Self::MissingFields(names) => format!("missing_fields={}", names.join(",")),
            Self::InvalidTimestamp => "invalid_timestamp".to_string(),
            Self::InvalidEventType => "invalid_event_type".to_string(),
        }
    }
}

/// A rejected input record, retained for inspection.
#[derive(Debug, Clone)]
pub struct QuarantinedRecord {
    /// 1-based line number in the source file, when known.
    pub line: Option<u64>,
    pub reason: RejectReason,
    /// The decoded input object, when the line decoded at all.
    pub record: Option<Map<String, Value>>,
    /// The raw line text, kept when the JSON parse itself failed.
    pub raw: Option<String>,
}

impl QuarantinedRecord {
    pub fn undecodable(line: u64, raw: impl Into<String>, parser_msg: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            reason: RejectReason::JsonDecode(parser_msg.into()),
            record: None,
            raw: Some(raw.into()),
        }
    }

    pub fn rejected(line: u64, record: Map<String, Value>, reason: RejectReason) -> Self {
        Self {
            line: Some(line),
            reason,
            record: Some(record),
            raw: None,
        }
    }

    /// Rejected during transform, after line numbers are gone.
    pub fn from_transform(record: Map<String, Value>, reason: RejectReason) -> Self {
        Self {
            line: None,
            reason,
            record: Some(record),
            raw: None,
        }
    }

    /// Render as the JSON object written to the quarantine file: the
    /// original record augmented with `_reason`, `_line`, and `_raw`.
    pub fn to_json(&self) -> Value {
        let mut obj = self.record.clone().unwrap_or_default();
        if let Some(line) = self.line {
            obj.insert("_line".to_string(), Value::from(line));
        }
        obj.insert("_reason".to_string(), Value::String(self.reason.code()));
        if let Some(raw) = &self.raw {
            obj.insert("_raw".to_string(), Value::String(raw.clone()));
        }
        Value::Object(obj)
    }
}
