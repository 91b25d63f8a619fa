//! End-to-end pipeline run: feeds on disk through to warehouse and
//! artifacts.

use integration_tests::fixtures::{
    event_line, quarantine_reasons, run_pipeline, USERS_CSV,
};
use warehouse::query;

#[test]
fn mixed_feed_splits_into_facts_and_quarantine() {
    let dir = tempfile::tempdir().unwrap();

    let feed = [
        event_line("e1", "2026-01-01T08:00:00Z", Some("1"), "signup"),
        // duplicate key, later timestamp wins
        event_line("e1", "2026-01-01T08:00:01Z", Some("1"), "signup"),
        // string amount coerces to a number
        "{\"event_id\":\"e2\",\"ts\":\"2026-01-01T09:00:00Z\",\"user_id\":\"1\",\"event\":\"purchase\",\"amount\":\"19.99\"}".to_string(),
        // synonym spelling collapses
        event_line("e3", "2026-01-01T10:00:00Z", Some("2"), "Page View"),
        // absent user is loaded, not dropped
        event_line("e4", "2026-01-01T11:00:00Z", None, "pageview"),
        // unmatched user keeps its id with null attributes
        event_line("e5", "2026-01-01T12:00:00Z", Some("999"), "pageview"),
        // outside the allow-list
        event_line("e6", "2026-01-01T13:00:00Z", Some("1"), "logout"),
        // invalid timestamp
        event_line("e7", "BAD_TIME", Some("1"), "signup"),
        // missing required field
        "{\"event_id\":\"e8\",\"event\":\"signup\"}".to_string(),
        // unparsable json
        "{broken".to_string(),
        String::new(),
    ]
    .join("\n");

    let run = run_pipeline(dir.path(), &feed, USERS_CSV);
    let wh = &run.warehouse;

    // 5 distinct good events survive: e1 (deduped), e2, e3, e4, e5
    assert_eq!(query::count_fact_events(wh).unwrap(), 5);
    assert_eq!(run.metrics.dedup_removed, 1);
    assert_eq!(run.metrics.invalid_event_type, 1);
    assert_eq!(run.metrics.null_user_id, 1);

    // dedup kept the later timestamp
    let ts: String = wh
        .conn()
        .query_row("SELECT ts FROM fact_events WHERE event_id = 'e1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(ts, "2026-01-01T08:00:01+00:00");

    // string amount became numeric
    let amount: f64 = wh
        .conn()
        .query_row("SELECT amount FROM fact_events WHERE event_id = 'e2'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(amount, 19.99);

    // synonym landed on the canonical kind
    let kind: String = wh
        .conn()
        .query_row(
            "SELECT e.event FROM fact_events f
             JOIN dim_event_types e ON e.event_type_id = f.event_type_id
             WHERE f.event_id = 'e3'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(kind, "pageview");

    // absent and unmatched users are both loaded
    let e4_user: Option<String> = wh
        .conn()
        .query_row("SELECT user_id FROM fact_events WHERE event_id = 'e4'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(e4_user, None);
    let e5_user: Option<String> = wh
        .conn()
        .query_row("SELECT user_id FROM fact_events WHERE event_id = 'e5'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(e5_user.as_deref(), Some("999"));

    // referential integrity: every fact resolves to a dimension row
    let orphans: i64 = wh
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM fact_events f
             LEFT JOIN dim_event_types d ON d.event_type_id = f.event_type_id
             WHERE d.event_type_id IS NULL",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);

    // quarantine: ingest rejects first, then the transform reject
    let reasons = quarantine_reasons(&run.bad_records_path);
    assert_eq!(reasons.len(), 4);
    assert_eq!(reasons[0], "invalid_timestamp");
    assert_eq!(reasons[1], "missing_fields=ts");
    assert!(reasons[2].starts_with("json_decode_error="));
    assert_eq!(reasons[3], "invalid_event_type");

    // quality report arithmetic
    assert_eq!(run.report.raw_lines, 10);
    assert_eq!(run.report.ingest_good, 7);
    assert_eq!(run.report.ingest_bad, 3);
    assert_eq!(run.report.rejected_total, 4);
    assert_eq!(run.report.reject_rate, 0.4);
    assert_eq!(run.report.loaded_rows, 5);

    // report artifact is on disk and parses
    let artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&run.report_path).unwrap()).unwrap();
    assert_eq!(artifact["rejected_total"], 4);
}

#[test]
fn analytics_queries_read_the_loaded_schema() {
    let dir = tempfile::tempdir().unwrap();
    let feed = [
        event_line("s1", "2026-01-01T08:00:00Z", Some("1"), "signup"),
        event_line("s2", "2026-01-01T08:05:00Z", Some("2"), "signup"),
        "{\"event_id\":\"p1\",\"ts\":\"2026-01-01T09:00:00Z\",\"user_id\":\"1\",\"event\":\"purchase\",\"amount\":10.5}".to_string(),
        event_line("v1", "2026-01-01T10:00:00Z", Some("1"), "pageview"),
    ]
    .join("\n");

    let run = run_pipeline(dir.path(), &feed, USERS_CSV);
    let wh = &run.warehouse;

    let dau = query::query_dau(wh).unwrap();
    assert_eq!(dau.len(), 1);
    assert_eq!(dau[0].dau, 2);

    let revenue = query::query_revenue(wh).unwrap();
    assert_eq!(revenue[0].revenue, 10.5);

    let funnel = query::query_funnel(wh).unwrap();
    assert_eq!(funnel[0].signup_users, 2);
    assert_eq!(funnel[0].purchasers, 1);
    assert_eq!(funnel[0].signup_to_purchase_rate, 0.5);

    let mix = query::query_event_counts(wh).unwrap();
    assert_eq!(mix.len(), 3);
}

#[test]
fn empty_feed_loads_nothing_and_reports_zeroes() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_pipeline(dir.path(), "", USERS_CSV);

    assert_eq!(query::count_fact_events(&run.warehouse).unwrap(), 0);
    assert_eq!(run.metrics.dedup_removed, 0);
    assert_eq!(run.metrics.invalid_event_type, 0);
    assert_eq!(run.report.raw_lines, 0);
    assert_eq!(run.report.reject_rate, 0.0);
    assert!(quarantine_reasons(&run.bad_records_path).is_empty());
}

#[test]
fn international_feed_loads_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_pipeline(dir.path(), "", USERS_CSV);
    let wh = &run.warehouse;

    let intl_path = dir.path().join("international_sales.jsonl");
    std::fs::write(
        &intl_path,
        concat!(
            "{\"sale_id\":\"s1\",\"ts\":\"2022-04-30T12:00:00\",\"customer\":\"ACME\",\"sku\":\"SKU-1\",\"pcs\":3,\"rate\":9.5,\"gross_amt\":28.5,\"currency\":\"EUR\",\"source_dataset\":\"intl.csv\"}\n",
            "{\"sale_id\":\"s2\",\"ts\":\"2022-04-30T12:00:00\",\"customer\":\"ACME\",\"sku\":\"SKU-2\",\"pcs\":1}\n",
            "{\"sale_id\":\"s3\",\"ts\":\"BAD\"}\n",
        ),
    )
    .unwrap();

    let intl = ingest::read_intl_jsonl(&intl_path).unwrap();
    assert_eq!(intl.dropped, 1);

    let stats = warehouse::upsert::upsert_fact_international_sales(wh, &intl.sales).unwrap();
    // s2 has no gross amount: dropped at load, not quarantined
    assert_eq!(stats.loaded, 1);
    assert_eq!(stats.dropped, 1);

    let count: i64 = wh
        .conn()
        .query_row("SELECT COUNT(*) FROM fact_international_sales", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert!(quarantine_reasons(&run.bad_records_path).is_empty());
}
