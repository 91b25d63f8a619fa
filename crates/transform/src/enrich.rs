//! Enrichment: user-id normalization, partition keys, dimension join.

use std::collections::HashMap;

use chrono::Timelike;

use pipeline_core::{CleanEvent, EventRecord, UserRow};

/// Textual tokens treated as an absent user id, compared case-insensitively
/// after trimming.
const NULLISH_TOKENS: &[&str] = &["", "nan", "none", "null", "<na>"];

/// Enriched records plus the null-user counter.
#[derive(Debug, Default)]
pub struct EnrichOutput {
    pub events: Vec<CleanEvent>,
    /// Output rows whose normalized `user_id` is absent. Unmatched-but-
    /// present ids keep their value and are not counted here.
    pub null_user_id: u64,
}

/// Normalize a raw user id: trim, and convert empty or null-ish text to a
/// true missing marker.
pub fn normalize_user_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if NULLISH_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Derive partition keys and left-join the user dimension.
///
/// Rows without a matching user keep null attributes; nothing is dropped
/// here.
pub fn enrich(records: Vec<EventRecord>, users: &[UserRow]) -> EnrichOutput {
    // Last row wins on duplicate feed keys, consistent with the
    // dimension's upsert semantics.
    let by_id: HashMap<&str, &UserRow> = users.iter().map(|u| (u.user_id.as_str(), u)).collect();

    let mut out = EnrichOutput::default();
    for record in records {
        let user_id = normalize_user_id(record.user_id.as_deref());
        if user_id.is_none() {
            out.null_user_id += 1;
        }
        let user = user_id.as_deref().and_then(|id| by_id.get(id));

        out.events.push(CleanEvent {
            event_date: record.ts.format("%Y-%m-%d").to_string(),
            event_hour: record.ts.hour(),
            country: user.map(|u| u.country.clone()),
            signup_source: user.map(|u| u.signup_source.clone()),
            event_id: record.event_id,
            ts: record.ts,
            user_id,
            event: record.event,
            amount: record.amount,
        });
    }
    out
}
