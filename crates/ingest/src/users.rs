//! User dimension feed (CSV).

use std::path::Path;

use tracing::{debug, info};

use pipeline_core::users::{UserRow, UNKNOWN};
use pipeline_core::{Error, Result};

/// Read the user dimension from a CSV file.
///
/// The feed must carry a `user_id` column; `country` and `signup_source`
/// are optional and default to the `"unknown"` sentinel when the column or
/// the value is absent. Rows with a blank `user_id` are skipped.
pub fn read_users_csv(path: &Path) -> Result<Vec<UserRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::feed(format!("open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::feed(format!("read headers: {e}")))?
        .clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let Some(user_id_col) = col("user_id") else {
        return Err(Error::feed(format!(
            "{}: missing required column user_id",
            path.display()
        )));
    };
    let country_col = col("country");
    let signup_source_col = col("signup_source");

    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for record in reader.records() {
        let record = record.map_err(|e| Error::feed(format!("read row: {e}")))?;
        let user_id = record.get(user_id_col).unwrap_or_default().trim();
        if user_id.is_empty() {
            skipped += 1;
            continue;
        }

        let attr = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        rows.push(UserRow {
            user_id: user_id.to_string(),
            country: attr(country_col),
            signup_source: attr(signup_source_col),
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped user rows with blank user_id");
    }
    info!(rows = rows.len(), "read user dimension feed");
    Ok(rows)
}
