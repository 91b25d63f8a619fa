//! Deduplication by natural key.

use std::collections::HashMap;

use pipeline_core::EventRecord;

/// Records after collapsing duplicate `event_id`s.
#[derive(Debug, Default)]
pub struct DedupOutput {
    pub events: Vec<EventRecord>,
    pub removed: u64,
}

/// Collapse records sharing an `event_id` to the one with the maximum `ts`;
/// ties go to the last-seen record.
///
/// Output is ordered by (`ts`, input position) so repeated runs over the
/// same input produce identical batches.
pub fn dedup_latest(records: Vec<EventRecord>) -> DedupOutput {
    let total = records.len();
    let mut winner: HashMap<String, usize> = HashMap::new();

    for (idx, record) in records.iter().enumerate() {
        match winner.get(&record.event_id) {
            Some(&current) if records[current].ts > record.ts => {}
            _ => {
                winner.insert(record.event_id.clone(), idx);
            }
        }
    }

    let mut keep: Vec<usize> = winner.into_values().collect();
    keep.sort_by_key(|&idx| (records[idx].ts, idx));

    let removed = (total - keep.len()) as u64;
    let mut records = records.into_iter().map(Some).collect::<Vec<_>>();
    let events = keep
        .into_iter()
        .map(|idx| records[idx].take().expect("winner index is unique"))
        .collect();

    DedupOutput { events, removed }
}
