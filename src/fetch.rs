use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::discover::EtfPage;

const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; YieldMaxScan/0.1)";

/// One fetched page, tagged with its position in the input list.
pub struct FetchedPage {
    pub index: usize,
    pub page: EtfPage,
    pub html: Result<String, String>,
}

pub fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Fetch pages concurrently with a bounded permit pool, streaming completions
/// over a channel; returns them re-sorted into input order.
pub async fn fetch_pages(client: &reqwest::Client, pages: Vec<EtfPage>) -> Result<Vec<FetchedPage>> {
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchedPage>(CONCURRENCY * 2);

    for (index, page) in pages.into_iter().enumerate() {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let html = fetch_with_retry(&client, &page.url, &page.slug).await;
            let _ = tx.send(FetchedPage { index, page, html }).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut fetched: Vec<FetchedPage> = Vec::with_capacity(total);
    while let Some(row) = rx.recv().await {
        fetched.push(row);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let errors = fetched.iter().filter(|f| f.html.is_err()).count();
    info!("Fetched {} pages ({} ok, {} errors)", total, total - errors, errors);

    fetched.sort_by_key(|f| f.index);
    Ok(fetched)
}

async fn fetch_with_retry(client: &reqwest::Client, url: &str, slug: &str) -> Result<String, String> {
    for attempt in 0..MAX_RETRIES {
        match fetch_one(client, url).await {
            Ok(body) => return Ok(body),
            Err((status, message)) => {
                let retryable = matches!(status, Some(s) if s == 429 || s >= 500);
                if !retryable {
                    return Err(message);
                }
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Retrying {} (attempt {}/{}), backing off {:.1}s",
                    slug,
                    attempt + 1,
                    MAX_RETRIES,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }

    fetch_one(client, url).await.map_err(|(_, message)| message)
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<String, (Option<u16>, String)> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| (None, e.to_string()))?;
    let status = res.status();
    if !status.is_success() {
        return Err((Some(status.as_u16()), format!("status {}", status)));
    }
    let body = res.text().await.map_err(|e| (None, e.to_string()))?;
    if body.is_empty() {
        return Err((None, "empty body".to_string()));
    }
    Ok(body)
}
