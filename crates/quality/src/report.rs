//! The run's observability artifact: aggregate counters plus derived
//! reject metrics, persisted as a JSON file rewritten each run.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use pipeline_core::Result;

/// Raw counters collected from the pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub raw_lines: u64,
    pub ingest_good: u64,
    pub ingest_bad: u64,
    pub transform_invalid_event_type: u64,
    pub loaded_rows: u64,
    pub dedup_removed: u64,
    pub null_user_id: u64,
}

/// The persisted quality report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QualityReport {
    pub run_utc: String,
    pub raw_lines: u64,
    pub ingest_good: u64,
    pub ingest_bad: u64,
    pub transform_invalid_event_type: u64,
    pub loaded_rows: u64,
    pub dedup_removed: u64,
    pub null_user_id: u64,
    pub rejected_total: u64,
    pub reject_rate: f64,
}

impl QualityReport {
    /// Build a report from stage counters, stamped with the current time.
    pub fn from_counters(counters: RunCounters) -> Self {
        Self::with_run_utc(
            counters,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        )
    }

    /// Build a report with an explicit timestamp (deterministic tests).
    pub fn with_run_utc(counters: RunCounters, run_utc: String) -> Self {
        let rejected_total = counters.ingest_bad + counters.transform_invalid_event_type;
        let reject_rate = if counters.raw_lines == 0 {
            0.0
        } else {
            rejected_total as f64 / counters.raw_lines as f64
        };

        Self {
            run_utc,
            raw_lines: counters.raw_lines,
            ingest_good: counters.ingest_good,
            ingest_bad: counters.ingest_bad,
            transform_invalid_event_type: counters.transform_invalid_event_type,
            loaded_rows: counters.loaded_rows,
            dedup_removed: counters.dedup_removed,
            null_user_id: counters.null_user_id,
            rejected_total,
            reject_rate,
        }
    }
}

/// Persist the report, replacing any previous run's artifact.
pub fn write_quality_report(path: &Path, report: &QualityReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;
    file.write_all(b"\n")?;

    info!(
        rejected_total = report.rejected_total,
        reject_rate = report.reject_rate,
        path = %path.display(),
        "wrote quality report"
    );
    Ok(())
}
