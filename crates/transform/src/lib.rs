//! Transform stage: clean, normalize, and enrich validated events.
//!
//! Runs after validation and before load, in a fixed order:
//! canonicalize + allow-list, dedup by `event_id`, then enrichment
//! (user-id normalization, date/hour derivation, user-dimension join).

pub mod dedup;
pub mod enrich;
pub mod normalize;

use tracing::info;

use pipeline_core::{CleanEvent, EventRecord, QuarantinedRecord, UserRow};

/// Counters reported by the transform stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformMetrics {
    pub dedup_removed: u64,
    pub null_user_id: u64,
    pub invalid_event_type: u64,
    pub rows_out: u64,
}

/// Output of the transform stage.
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub events: Vec<CleanEvent>,
    pub quarantined: Vec<QuarantinedRecord>,
    pub metrics: TransformMetrics,
}

/// Clean, normalize, and enrich a batch of validated records.
pub fn transform(records: Vec<EventRecord>, users: &[UserRow]) -> TransformOutput {
    if records.is_empty() {
        return TransformOutput::default();
    }

    let normalized = normalize::enforce_allowed_kinds(records);
    let invalid_event_type = normalized.quarantined.len() as u64;

    let deduped = dedup::dedup_latest(normalized.events);

    let enriched = enrich::enrich(deduped.events, users);

    let metrics = TransformMetrics {
        dedup_removed: deduped.removed,
        null_user_id: enriched.null_user_id,
        invalid_event_type,
        rows_out: enriched.events.len() as u64,
    };

    info!(
        rows = metrics.rows_out,
        dedup_removed = metrics.dedup_removed,
        null_user_id = metrics.null_user_id,
        invalid_event_type = metrics.invalid_event_type,
        "transformed event batch"
    );

    TransformOutput {
        events: enriched.events,
        quarantined: normalized.quarantined,
        metrics,
    }
}
