//! Event-kind canonicalization and allow-list enforcement.

use serde_json::{Map, Value};

use pipeline_core::event_types;
use pipeline_core::quarantine::{QuarantinedRecord, RejectReason};
use pipeline_core::EventRecord;

/// Records split by the allow-list.
#[derive(Debug, Default)]
pub struct NormalizeOutput {
    pub events: Vec<EventRecord>,
    pub quarantined: Vec<QuarantinedRecord>,
}

/// Canonicalize every record's event label, then quarantine records whose
/// canonical kind falls outside the allowed set.
///
/// Quarantine entries carry `event_id`, `ts`, `user_id`, and the
/// canonicalized `event` for traceability.
pub fn enforce_allowed_kinds(records: Vec<EventRecord>) -> NormalizeOutput {
    let mut out = NormalizeOutput::default();

    for mut record in records {
        record.event = event_types::canonicalize(&record.event);
        if event_types::is_allowed(&record.event) {
            out.events.push(record);
        } else {
            out.quarantined.push(QuarantinedRecord::from_transform(
                trace_fields(&record),
                RejectReason::InvalidEventType,
            ));
        }
    }

    out
}

fn trace_fields(record: &EventRecord) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("event_id".to_string(), Value::String(record.event_id.clone()));
    obj.insert("ts".to_string(), Value::String(record.ts.to_rfc3339()));
    obj.insert(
        "user_id".to_string(),
        record.user_id.clone().map(Value::String).unwrap_or(Value::Null),
    );
    obj.insert("event".to_string(), Value::String(record.event.clone()));
    obj
}
