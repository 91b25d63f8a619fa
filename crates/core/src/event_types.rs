//! Canonical event kinds and label canonicalization.
//!
//! Raw feeds spell event kinds inconsistently (`"Page View"`, `"page_view"`,
//! `"PURCHASE "`). Everything is collapsed into a small closed set before it
//! can reach the warehouse; anything outside the set is quarantined.

/// Canonical event kind values.
pub const PAGEVIEW: &str = "pageview";
pub const SIGNUP: &str = "signup";
pub const PURCHASE: &str = "purchase";

/// The closed set of event kinds allowed into the fact table.
pub const ALLOWED: &[&str] = &[PAGEVIEW, SIGNUP, PURCHASE];

/// Returns true if `kind` (already canonicalized) is in the allowed set.
pub fn is_allowed(kind: &str) -> bool {
    ALLOWED.contains(&kind)
}

/// Canonicalize a raw event label.
///
/// Trims, lowercases, rewrites `-` and internal whitespace to `_`, then
/// collapses known synonym spellings into their canonical form. The result
/// is not necessarily allowed; callers check [`is_allowed`] separately.
pub fn canonicalize(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect();

    match folded.as_str() {
        "page_view" => PAGEVIEW.to_string(),
        _ => folded,
    }
}
