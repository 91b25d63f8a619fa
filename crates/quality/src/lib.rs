//! Data quality reporting for pipeline runs.

pub mod report;

pub use report::{write_quality_report, QualityReport, RunCounters};
