//! Test fixtures: feed files on disk plus a full pipeline run.

use std::fs;
use std::path::{Path, PathBuf};

use quality::{write_quality_report, QualityReport, RunCounters};
use transform::TransformMetrics;
use warehouse::{upsert, Warehouse};

/// A small user dimension shared by most scenarios.
pub const USERS_CSV: &str = "user_id,country,signup_source\n1,US,organic\n2,DE,ads\n";

/// Fixed run timestamp so re-runs produce identical artifacts.
pub const RUN_UTC: &str = "2026-08-06T00:00:00+00:00";

/// Render one event feed line.
pub fn event_line(event_id: &str, ts: &str, user_id: Option<&str>, event: &str) -> String {
    let user_id = match user_id {
        Some(id) => serde_json::Value::from(id),
        None => serde_json::Value::Null,
    };
    serde_json::json!({
        "event_id": event_id,
        "ts": ts,
        "user_id": user_id,
        "event": event,
    })
    .to_string()
}

/// Everything a test wants to inspect after a run.
pub struct RunArtifacts {
    pub warehouse: Warehouse,
    pub report: QualityReport,
    pub metrics: TransformMetrics,
    pub bad_records_path: PathBuf,
    pub report_path: PathBuf,
}

/// Run the full pipeline over literal feed contents, the same stage wiring
/// as the binary: ingest, transform, quarantine write, dimension and fact
/// upserts, quality report.
pub fn run_pipeline(dir: &Path, events_jsonl: &str, users_csv: &str) -> RunArtifacts {
    let events_path = dir.join("events.jsonl");
    fs::write(&events_path, events_jsonl).unwrap();
    let users_path = dir.join("users.csv");
    fs::write(&users_path, users_csv).unwrap();

    let ingested = ingest::read_events_jsonl(&events_path).unwrap();
    let users = ingest::read_users_csv(&users_path).unwrap();

    let raw_lines = ingested.raw_lines;
    let ingest_good = ingested.events.len() as u64;
    let ingest_bad = ingested.quarantined.len() as u64;

    let transformed = transform::transform(ingested.events, &users);

    let mut bad_records = ingested.quarantined;
    bad_records.extend(transformed.quarantined);
    let bad_records_path = dir.join("bad_records.jsonl");
    ingest::write_bad_records(&bad_records_path, &bad_records).unwrap();

    let warehouse = Warehouse::open(&dir.join("warehouse.db")).unwrap();
    upsert::upsert_dim_event_types(&warehouse, &transformed.events).unwrap();
    upsert::upsert_dim_dates(&warehouse, &transformed.events).unwrap();
    upsert::upsert_dim_users(&warehouse, &transformed.events).unwrap();
    let loaded_rows = upsert::upsert_fact_events(&warehouse, &transformed.events).unwrap() as u64;

    let report = QualityReport::with_run_utc(
        RunCounters {
            raw_lines,
            ingest_good,
            ingest_bad,
            transform_invalid_event_type: transformed.metrics.invalid_event_type,
            loaded_rows,
            dedup_removed: transformed.metrics.dedup_removed,
            null_user_id: transformed.metrics.null_user_id,
        },
        RUN_UTC.to_string(),
    );
    let report_path = dir.join("data_quality_report.json");
    write_quality_report(&report_path, &report).unwrap();

    RunArtifacts {
        warehouse,
        report,
        metrics: transformed.metrics,
        bad_records_path,
        report_path,
    }
}

/// All fact rows in a stable order, for run-to-run comparisons.
pub fn fact_snapshot(wh: &Warehouse) -> Vec<(String, String, Option<String>, i64, Option<f64>, String, i64)> {
    let mut stmt = wh
        .conn()
        .prepare(
            "SELECT event_id, ts, user_id, event_type_id, amount, event_date, event_hour
             FROM fact_events ORDER BY event_id",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .unwrap();
    rows.collect::<rusqlite::Result<Vec<_>>>().unwrap()
}

/// Reasons in the quarantine file, in file order.
pub fn quarantine_reasons(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["_reason"].as_str().unwrap().to_string()
        })
        .collect()
}
