//! JSONL event reader: parse, validate, quarantine.
//!
//! Consumes raw text lines and produces two streams: typed good records and
//! quarantined records with reasons. This stage writes no files; callers
//! persist the quarantine output.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use pipeline_core::quarantine::{QuarantinedRecord, RejectReason};
use pipeline_core::record::{EventRecord, REQUIRED_FIELDS};
use pipeline_core::Result;

/// Output of the validation stage.
#[derive(Debug, Default)]
pub struct IngestResult {
    pub events: Vec<EventRecord>,
    pub quarantined: Vec<QuarantinedRecord>,
    /// Non-blank input lines seen; equals `events.len() + quarantined.len()`.
    pub raw_lines: u64,
}

/// Validate a sequence of raw JSONL lines.
///
/// Line numbers are 1-based over the full input, blank lines included, so
/// quarantine entries point back at the real file location.
pub fn validate_lines(lines: impl Iterator<Item = String>) -> IngestResult {
    let mut result = IngestResult::default();

    for (idx, line) in lines.enumerate() {
        let line_no = idx as u64 + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        result.raw_lines += 1;

        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                result
                    .quarantined
                    .push(QuarantinedRecord::undecodable(line_no, line, e.to_string()));
                continue;
            }
        };

        let Some(obj) = value.as_object() else {
            // A JSON scalar or array has none of the required fields.
            result.quarantined.push(QuarantinedRecord {
                line: Some(line_no),
                reason: RejectReason::missing_fields(
                    REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
                ),
                record: None,
                raw: Some(line.to_string()),
            });
            continue;
        };

        match EventRecord::from_object(obj) {
            Ok(record) => result.events.push(record),
            Err(reason) => result
                .quarantined
                .push(QuarantinedRecord::rejected(line_no, obj.clone(), reason)),
        }
    }

    info!(
        read = result.raw_lines,
        good = result.events.len(),
        bad = result.quarantined.len(),
        "validated event lines"
    );
    result
}

/// Read and validate a JSONL event file.
pub fn read_events_jsonl(path: &Path) -> Result<IngestResult> {
    let file = File::open(path)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line?);
    }
    Ok(validate_lines(lines.into_iter()))
}
