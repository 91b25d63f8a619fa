//! Quarantine sink: one JSON object per rejected record.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use pipeline_core::{QuarantinedRecord, Result};

/// Write the run's quarantined records.
///
/// The file is rewritten in full on every run; quarantine does not
/// accumulate across runs.
pub fn write_bad_records(path: &Path, records: &[QuarantinedRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut out, &record.to_json())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(count = records.len(), path = %path.display(), "wrote quarantine file");
    Ok(())
}
