use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::normalize::{normalize_header, parse_currency, parse_ex_date};
use super::{AnalyzeError, Observation};

static SCAN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, table").unwrap());
static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static HEAD_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead th, thead td").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static BODY_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").unwrap());
static DATA_CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Amount-column keywords, most specific first.
const AMOUNT_KEYWORDS: &[&str] = &["distribution per share", "distribution", "amount", "dividend"];
const EX_KEYWORD: &str = "ex";
const HEADING_QUALIFIERS: &[&str] = &["details", "history", "summary"];

/// Collect an element's descendant text with whitespace collapsed.
fn collect_text(el: ElementRef) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locate the distribution history table.
///
/// Headings h1..h4 whose text mentions "distribution" together with
/// details/history/summary anchor the table that follows them in document
/// order; when several headings qualify, the last one wins. Without an
/// anchored table, fall back to the first table whose header row names both
/// an amount column and an ex-date column.
pub fn find_distribution_table(doc: &Html) -> Option<ElementRef<'_>> {
    let mut chosen: Option<ElementRef> = None;
    let mut pending = false;
    for el in doc.select(&SCAN_SELECTOR) {
        if el.value().name() == "table" {
            if pending && el.select(&CELL_SELECTOR).next().is_some() {
                chosen = Some(el);
                pending = false;
            }
        } else {
            let text = normalize_header(&collect_text(el));
            if text.contains("distribution") && HEADING_QUALIFIERS.iter().any(|q| text.contains(q)) {
                pending = true;
            }
        }
    }
    if chosen.is_some() {
        return chosen;
    }

    doc.select(&TABLE_SELECTOR).find(|table| {
        let (headers, _) = header_texts(*table);
        let has_amount = headers
            .iter()
            .any(|h| AMOUNT_KEYWORDS.iter().any(|k| h.contains(k)));
        let has_ex = headers.iter().any(|h| h.contains(EX_KEYWORD));
        has_amount && has_ex
    })
}

/// Normalized header cells: the thead region when present, else the first
/// row. The flag records whether a thead supplied them; without one the first
/// row doubles as the header and must not be read as data.
fn header_texts(table: ElementRef) -> (Vec<String>, bool) {
    let cells: Vec<String> = table
        .select(&HEAD_CELL_SELECTOR)
        .map(|c| normalize_header(&collect_text(c)))
        .collect();
    if !cells.is_empty() {
        return (cells, true);
    }
    let cells = table
        .select(&ROW_SELECTOR)
        .next()
        .map(|row| {
            row.select(&CELL_SELECTOR)
                .map(|c| normalize_header(&collect_text(c)))
                .collect()
        })
        .unwrap_or_default();
    (cells, false)
}

struct Columns {
    ex: usize,
    amount: usize,
}

fn resolve_columns(headers: &[String]) -> Option<Columns> {
    let ex = headers.iter().position(|h| h.contains(EX_KEYWORD))?;
    let amount = AMOUNT_KEYWORDS
        .iter()
        .find_map(|k| headers.iter().position(|h| h.contains(k)))?;
    Some(Columns { ex, amount })
}

/// Locate the table, resolve its columns, and collect every row both cells
/// of which normalize, sorted ascending by ex-date. Rows that fail
/// normalization are dropped silently; duplicate dates are retained.
pub fn extract_series(doc: &Html) -> Result<Vec<Observation>, AnalyzeError> {
    let table = find_distribution_table(doc).ok_or(AnalyzeError::TableNotFound)?;
    let (headers, from_thead) = header_texts(table);
    let cols = resolve_columns(&headers).ok_or_else(|| AnalyzeError::HeadersNotFound {
        headers: headers.join(", "),
    })?;

    let mut rows: Vec<ElementRef> = table.select(&BODY_ROW_SELECTOR).collect();
    if rows.is_empty() {
        rows = table.select(&ROW_SELECTOR).collect();
    }
    // The parser wraps stray rows in a tbody, so a headerless table's first
    // row lands in the body region and has to be skipped by position.
    if !from_thead && !rows.is_empty() {
        rows.remove(0);
    }

    let mut series = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.select(&DATA_CELL_SELECTOR).map(collect_text).collect();
        if cells.is_empty() {
            continue;
        }
        let ex_date = cells.get(cols.ex).and_then(|c| parse_ex_date(c));
        let amount = cells.get(cols.amount).and_then(|c| parse_currency(c));
        if let (Some(ex_date), Some(amount)) = (ex_date, amount) {
            series.push(Observation { ex_date, amount });
        }
    }
    if series.is_empty() {
        return Err(AnalyzeError::NoValidRows);
    }

    // Stable, so same-day rows keep page order
    series.sort_by_key(|o| o.ex_date);
    Ok(series)
}

// ── Tests ──
