use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([A-Z]{2,6})\)").unwrap());
static EXCHANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:NYSE Arca|NYSE|NASDAQ|AMEX):\s*([A-Za-z.\-]{2,6})").unwrap());
static TICKER_SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z.\-]{2,8}$").unwrap());

static OG_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Slugs that look ticker-shaped but are category index pages.
const CATEGORY_WORDS: &[&str] = &[
    "COVEREDCALL", "INCOME", "BOND", "BONDS", "EQUITY", "OPTION", "OPTIONS", "LEVERAGED",
    "INDEX", "SECTOR", "THEME", "THEMES",
];

/// Uppercase alphanumeric guess derived from a page slug.
pub fn guess_from_slug(slug: &str) -> String {
    slug.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Resolve the fund ticker from page metadata: a parenthesized ticker or an
/// exchange-prefixed one in og:title / title / the first h1, then the slug
/// guess when it is ticker-shaped, then an UNKNOWN label.
pub fn resolve(doc: &Html, slug: &str) -> String {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(meta) = doc.select(&OG_TITLE_SELECTOR).next() {
        if let Some(content) = meta.value().attr("content") {
            candidates.push(content.to_string());
        }
    }
    if let Some(title) = doc.select(&TITLE_SELECTOR).next() {
        candidates.push(title.text().collect());
    }
    if let Some(h1) = doc.select(&H1_SELECTOR).next() {
        candidates.push(h1.text().collect());
    }

    for text in &candidates {
        if let Some(caps) = PAREN_RE.captures(text) {
            return caps[1].to_string();
        }
        if let Some(caps) = EXCHANGE_RE.captures(text) {
            return caps[1].to_uppercase();
        }
    }

    let guess = guess_from_slug(slug);
    if !CATEGORY_WORDS.contains(&guess.as_str()) && TICKER_SHAPE_RE.is_match(&guess) {
        return guess;
    }

    if slug.is_empty() {
        "UNKNOWN-ETF".to_string()
    } else {
        format!("UNKNOWN-{}", slug.to_uppercase())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn parenthesized_ticker_in_title_wins() {
        let d = doc("<html><head><title>TSLA Option Income Strategy ETF (TSLY)</title></head><body></body></html>");
        assert_eq!(resolve(&d, "some-fund"), "TSLY");
    }

    #[test]
    fn og_title_checked_before_title() {
        let d = doc(
            r#"<html><head><meta property="og:title" content="YieldMax ULTY Fund (ULTY)">
            <title>No ticker here</title></head><body></body></html>"#,
        );
        assert_eq!(resolve(&d, "other"), "ULTY");
    }

    #[test]
    fn exchange_prefix_recognized() {
        let d = doc("<html><body><h1>Income Fund - NYSE Arca: msty</h1></body></html>");
        assert_eq!(resolve(&d, "whatever"), "MSTY");
    }

    #[test]
    fn slug_guess_fallback() {
        let d = doc("<html><body><p>nothing useful</p></body></html>");
        assert_eq!(resolve(&d, "nvdy"), "NVDY");
    }

    #[test]
    fn category_slugs_do_not_pass_as_tickers() {
        let d = doc("<html><body></body></html>");
        assert_eq!(resolve(&d, "income"), "UNKNOWN-INCOME");
        assert_eq!(resolve(&d, "covered-call"), "UNKNOWN-COVERED-CALL");
    }

    #[test]
    fn numeric_slugs_rejected() {
        let d = doc("<html><body></body></html>");
        assert_eq!(resolve(&d, "2x-etf"), "UNKNOWN-2X-ETF");
    }
}
