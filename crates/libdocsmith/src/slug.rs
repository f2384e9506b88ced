//! Filesystem-safe path segments.

use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of characters that may not appear in a path segment.
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("slug pattern"));

/// Placeholder for inputs that leave nothing usable behind.
pub const PLACEHOLDER: &str = "unknown";

/// Render `value` as a single path segment.
///
/// Every run of characters outside `[A-Za-z0-9._-]` becomes one underscore and leading or trailing
/// underscores are trimmed. Empty results, and results made only of dots, become
/// [`PLACEHOLDER`]. The function is idempotent.
pub fn slug(value: &str) -> String {
    let replaced = DISALLOWED.replace_all(value, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return PLACEHOLDER.to_string();
    }
    trimmed.to_string()
}
