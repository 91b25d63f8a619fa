//! Batch event pipeline
//!
//! One full pass per run:
//! - validate raw JSONL events, quarantine bad records
//! - transform (canonicalize, dedup, enrich with the user dimension)
//! - load the star-schema warehouse with idempotent upserts
//! - write the quarantine file and data quality report

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use quality::{write_quality_report, QualityReport, RunCounters};
use telemetry::init_tracing_from_env;
use warehouse::{upsert, Warehouse, WarehouseConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Raw event feed (line-delimited JSON)
    #[serde(default = "default_events_path")]
    events_path: PathBuf,

    /// User dimension feed (CSV)
    #[serde(default = "default_users_path")]
    users_path: PathBuf,

    /// Optional secondary feed; skipped when the file does not exist
    #[serde(default = "default_intl_path")]
    intl_path: PathBuf,

    /// Directory for run artifacts (quarantine file, quality report)
    #[serde(default = "default_out_dir")]
    out_dir: PathBuf,

    #[serde(default)]
    warehouse: WarehouseConfig,
}

fn default_events_path() -> PathBuf {
    PathBuf::from("data/raw/events.jsonl")
}

fn default_users_path() -> PathBuf {
    PathBuf::from("data/raw/users.csv")
}

fn default_intl_path() -> PathBuf {
    PathBuf::from("data/raw/international_sales.jsonl")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("data/output")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
            users_path: default_users_path(),
            intl_path: default_intl_path(),
            out_dir: default_out_dir(),
            warehouse: WarehouseConfig::default(),
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();
    info!("Starting event pipeline v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    run(&config)
}

fn run(config: &Config) -> Result<()> {
    // Ingest
    let ingested = ingest::read_events_jsonl(&config.events_path)
        .with_context(|| format!("Failed to read events from {}", config.events_path.display()))?;
    let users = ingest::read_users_csv(&config.users_path)
        .with_context(|| format!("Failed to read users from {}", config.users_path.display()))?;

    let raw_lines = ingested.raw_lines;
    let ingest_good = ingested.events.len() as u64;
    let ingest_bad = ingested.quarantined.len() as u64;

    // Transform
    let transformed = transform::transform(ingested.events, &users);

    // One quarantine file per run: ingest rejects first, then transform rejects
    let mut bad_records = ingested.quarantined;
    bad_records.extend(transformed.quarantined);
    ingest::write_bad_records(&config.out_dir.join("bad_records.jsonl"), &bad_records)
        .context("Failed to write quarantine file")?;

    // Load: dimensions in dependency order, then facts
    let wh = Warehouse::open(&config.warehouse.db_path).context("Failed to open warehouse")?;
    upsert::upsert_dim_event_types(&wh, &transformed.events)?;
    upsert::upsert_dim_dates(&wh, &transformed.events)?;
    upsert::upsert_dim_users(&wh, &transformed.events)?;
    let loaded_rows = upsert::upsert_fact_events(&wh, &transformed.events)
        .context("Failed to load fact_events")? as u64;

    if config.intl_path.exists() {
        let intl = ingest::read_intl_jsonl(&config.intl_path)
            .with_context(|| format!("Failed to read {}", config.intl_path.display()))?;
        let stats = upsert::upsert_fact_international_sales(&wh, &intl.sales)
            .context("Failed to load fact_international_sales")?;
        info!(loaded = stats.loaded, dropped = stats.dropped, "loaded international sales");
    } else {
        info!("no international sales feed found; skipping secondary load");
    }

    // Quality report
    let report = QualityReport::from_counters(RunCounters {
        raw_lines,
        ingest_good,
        ingest_bad,
        transform_invalid_event_type: transformed.metrics.invalid_event_type,
        loaded_rows,
        dedup_removed: transformed.metrics.dedup_removed,
        null_user_id: transformed.metrics.null_user_id,
    });
    write_quality_report(&config.out_dir.join("data_quality_report.json"), &report)
        .context("Failed to write quality report")?;

    info!(
        db = %config.warehouse.db_path.display(),
        loaded_rows,
        rejected_total = report.rejected_total,
        "pipeline run complete"
    );
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("PIPELINE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
