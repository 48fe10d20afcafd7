use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::info;

const OUR_ETFS_URL: &str = "https://www.yieldmaxetfs.com/our-etfs/";
static DETAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://www\.yieldmaxetfs\.com/our-etfs/([a-z0-9-]+)/$").unwrap()
});
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// One candidate ETF detail page.
#[derive(Debug, Clone)]
pub struct EtfPage {
    pub slug: String,
    pub url: String,
}

/// Fetch the "Our ETFs" index and return deduplicated detail-page links.
pub async fn discover_pages(client: &reqwest::Client) -> Result<Vec<EtfPage>> {
    info!("Fetching ETF index: {}", OUR_ETFS_URL);
    let html = client
        .get(OUR_ETFS_URL)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("Failed to fetch the ETF index page")?;

    let pages = harvest_links(&html);
    info!("ETF detail pages after filtering: {}", pages.len());
    if pages.is_empty() {
        bail!("No ETF detail pages found on the index");
    }
    Ok(pages)
}

/// Pull /our-etfs/<slug>/ anchors out of the index markup: absolutize
/// leading-slash links, normalize the trailing slash, drop everything that
/// is not a detail page, dedup and sort.
pub fn harvest_links(html: &str) -> Vec<EtfPage> {
    let doc = Html::parse_document(html);
    let mut urls: BTreeSet<String> = BTreeSet::new();
    for anchor in doc.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        let mut url = if href.starts_with('/') {
            format!("https://www.yieldmaxetfs.com{}", href)
        } else {
            href.to_string()
        };
        if !url.ends_with('/') {
            url.push('/');
        }
        if DETAIL_RE.is_match(&url) {
            urls.insert(url);
        }
    }

    urls.into_iter()
        .filter_map(|url| {
            let slug = DETAIL_RE.captures(&url)?.get(1)?.as_str().to_lowercase();
            Some(EtfPage { slug, url })
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvests_detail_links_only() {
        let html = r#"<html><body>
            <a href="/our-etfs/tsly/">TSLY</a>
            <a href="https://www.yieldmaxetfs.com/our-etfs/msty">MSTY</a>
            <a href="/our-etfs/">Our ETFs</a>
            <a href="/about/">About</a>
            <a href="https://example.com/our-etfs/fake/">elsewhere</a>
        </body></html>"#;
        let pages = harvest_links(html);
        let slugs: Vec<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["msty", "tsly"]);
        assert!(pages.iter().all(|p| p.url.ends_with('/')));
    }

    #[test]
    fn duplicates_collapse() {
        let html = r#"<html><body>
            <a href="/our-etfs/nvdy/">NVDY</a>
            <a href="https://www.yieldmaxetfs.com/our-etfs/nvdy/">NVDY again</a>
        </body></html>"#;
        assert_eq!(harvest_links(html).len(), 1);
    }

    #[test]
    fn empty_index_yields_nothing() {
        assert!(harvest_links("<html><body><p>down for maintenance</p></body></html>").is_empty());
    }
}
