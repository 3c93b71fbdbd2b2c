//! Pre-execution query safety gate.
//!
//! This is a best-effort textual filter, not a SQL parser and not a
//! security boundary: it only inspects keyword presence after a two-pass
//! comment strip. Statements smuggled through quoting tricks it does not
//! parse will reach the backend, where a read-only database role is the
//! real line of defense.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlConnectorError;

static LINE_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)--[^\n]*").expect("line comment pattern is valid")
});

static BLOCK_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid")
});

static MUTATING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(DROP|DELETE|UPDATE|INSERT|ALTER|CREATE|TRUNCATE|GRANT|REVOKE)\b")
        .expect("keyword pattern is valid")
});

/// Strip SQL comments: `--` to end of line first, then `/* ... */`
/// non-greedily. Block comments do not nest; a `/*` inside a block closes
/// at the first `*/`. Idempotent on already-clean input.
#[must_use]
pub fn remove_comments(sql: &str) -> String {
    let without_line = LINE_COMMENTS.replace_all(sql, "");
    let without_block = BLOCK_COMMENTS.replace_all(&without_line, "");
    without_block.trim().to_string()
}

/// Reject empty queries and queries containing a mutating keyword outside
/// of comments.
///
/// # Errors
///
/// Returns `SqlConnectorError::QueryError` when the query is empty after
/// trimming or when a mutating keyword survives comment removal.
pub fn validate_query(sql: &str) -> Result<(), SqlConnectorError> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(SqlConnectorError::QueryError(
            "SQL query must be a non-empty string".to_string(),
        ));
    }

    let cleaned = remove_comments(trimmed);
    if MUTATING_KEYWORDS.is_match(&cleaned) {
        return Err(SqlConnectorError::QueryError(
            "potentially dangerous SQL command detected; only read statements are allowed"
                .to_string(),
        ));
    }

    Ok(())
}
