//! User dimension row.

/// One row of the user dimension feed.
///
/// Attributes missing from the feed carry the `"unknown"` sentinel rather
/// than null; the dimension itself never stores nulls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: String,
    pub country: String,
    pub signup_source: String,
}

/// Sentinel for absent dimension attributes.
pub const UNKNOWN: &str = "unknown";

impl UserRow {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            country: UNKNOWN.to_string(),
            signup_source: UNKNOWN.to_string(),
        }
    }
}
