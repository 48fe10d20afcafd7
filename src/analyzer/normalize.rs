use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

/// Date formats seen across distribution tables, tried in order.
/// chrono's `%b` accepts both abbreviated and full month names.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%b %d %Y", "%m/%d/%Y", "%m/%d/%y"];

/// Parse a currency cell ("$0.4653", "1,234.50") into a plain number.
/// None when nothing is left after stripping, or the remainder is not finite.
pub fn parse_currency(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an ex-date cell into a calendar date. Ordinal suffixes
/// ("Aug 15th, 2025") are stripped before the format sweep.
pub fn parse_ex_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned = ORDINAL_RE.replace_all(trimmed, "$1");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Lowercase, single-spaced, trimmed. Only for header-role matching.
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ── Tests ──
