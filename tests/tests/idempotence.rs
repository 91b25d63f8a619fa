//! Re-running the pipeline must converge, not accumulate.

use integration_tests::fixtures::{event_line, fact_snapshot, quarantine_reasons, run_pipeline, USERS_CSV};
use warehouse::query;

fn feed() -> String {
    [
        event_line("e1", "2026-01-01T08:00:00Z", Some("1"), "signup"),
        event_line("e2", "2026-01-01T09:00:00Z", Some("2"), "purchase"),
        event_line("e3", "2026-01-01T10:00:00Z", None, "pageview"),
        event_line("e4", "2026-01-01T11:00:00Z", Some("1"), "logout"),
    ]
    .join("\n")
}

#[test]
fn second_run_produces_an_identical_fact_table() {
    let dir = tempfile::tempdir().unwrap();

    let first = run_pipeline(dir.path(), &feed(), USERS_CSV);
    let snapshot_one = fact_snapshot(&first.warehouse);
    drop(first);

    let second = run_pipeline(dir.path(), &feed(), USERS_CSV);
    let snapshot_two = fact_snapshot(&second.warehouse);

    assert_eq!(snapshot_one, snapshot_two);
    assert_eq!(query::count_fact_events(&second.warehouse).unwrap(), 3);
}

#[test]
fn surrogate_ids_survive_re_runs() {
    let dir = tempfile::tempdir().unwrap();

    let first = run_pipeline(dir.path(), &feed(), USERS_CSV);
    let ids_one = warehouse::upsert::event_type_id_map(&first.warehouse).unwrap();
    drop(first);

    let second = run_pipeline(dir.path(), &feed(), USERS_CSV);
    let ids_two = warehouse::upsert::event_type_id_map(&second.warehouse).unwrap();

    assert_eq!(ids_one, ids_two);
}

#[test]
fn overlapping_rerun_overwrites_instead_of_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    run_pipeline(dir.path(), &feed(), USERS_CSV);

    // same natural key, newer payload
    let updated = event_line("e2", "2026-01-02T09:00:00Z", Some("1"), "purchase");
    let run = run_pipeline(dir.path(), &updated, USERS_CSV);

    // e1/e3 from the first run are untouched; e2 was overwritten in place
    assert_eq!(query::count_fact_events(&run.warehouse).unwrap(), 3);
    let (ts, user_id): (String, Option<String>) = run
        .warehouse
        .conn()
        .query_row(
            "SELECT ts, user_id FROM fact_events WHERE event_id = 'e2'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(ts, "2026-01-02T09:00:00+00:00");
    assert_eq!(user_id.as_deref(), Some("1"));
}

#[test]
fn quarantine_file_is_rewritten_not_appended() {
    let dir = tempfile::tempdir().unwrap();

    let first = run_pipeline(dir.path(), &feed(), USERS_CSV);
    assert_eq!(quarantine_reasons(&first.bad_records_path).len(), 1);
    drop(first);

    // clean feed on the second run: quarantine must come back empty
    let clean = event_line("e9", "2026-01-03T08:00:00Z", Some("1"), "signup");
    let second = run_pipeline(dir.path(), &clean, USERS_CSV);
    assert!(quarantine_reasons(&second.bad_records_path).is_empty());
}
