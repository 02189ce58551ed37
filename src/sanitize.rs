//! Response sanitization
//!
//! Superficial text cleanup only. Nothing here parses SQL.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Opening code fence with an optional dialect tag, or a bare "sql" tag.
    static ref LEADING_FENCE: Regex =
        Regex::new(r"(?i)^(?:```[ \t]*(?:(?:sql|postgresql|postgres|psql)\b)?|sql\b:?)\s*")
            .unwrap();
    static ref TRAILING_FENCE: Regex = Regex::new(r"\s*```\s*$").unwrap();
}

/// Clean a generated response into a bare SQL statement.
///
/// Trims whitespace, drops a leading fence/language tag and a trailing fence,
/// then removes one trailing `;`.
pub fn sanitize_generated(text: &str) -> String {
    let trimmed = text.trim();
    let without_open = LEADING_FENCE.replace(trimmed, "");
    let without_close = TRAILING_FENCE.replace(&without_open, "");
    strip_terminator(without_close.trim())
}

/// Outcome of checking a correction response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionCheck {
    Valid(String),
    /// Empty, or does not start with `SELECT`
    Invalid,
}

/// Validate a correction response: it must start with the literal `SELECT`.
///
/// Fences are not stripped here, so a fenced correction is invalid.
pub fn check_correction(text: &str) -> CorrectionCheck {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.starts_with("SELECT") {
        return CorrectionCheck::Invalid;
    }
    CorrectionCheck::Valid(strip_terminator(trimmed))
}

fn strip_terminator(sql: &str) -> String {
    sql.strip_suffix(';').unwrap_or(sql).trim().to_string()
}
