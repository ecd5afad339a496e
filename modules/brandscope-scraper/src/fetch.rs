use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::warn;

use browser_pool::{BrowserPool, BrowserSession, PoolError};

use brandscope_core::types::Page;

/// How long a fetch waits for a pool worker before giving up on that URL.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-page navigation budget.
const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs in the page after load: drop chrome-y subtrees, return the body text.
const EXTRACT_TEXT: &str = r#"
(() => {
  for (const sel of ['script', 'style', 'nav', 'footer', 'header']) {
    for (const el of Array.from(document.querySelectorAll(sel))) {
      el.remove();
    }
  }
  return document.body ? document.body.innerText : '';
})()
"#;

/// Fetch every URL through the browser pool, at most `concurrency` in
/// flight. Individual failures are logged and absorbed.
pub async fn fetch_pages(
    pool: &BrowserPool,
    urls: &[String],
    concurrency: usize,
) -> Vec<Page> {
    let fetched: Vec<Option<Page>> = stream::iter(urls.iter().map(|url| fetch_one(pool, url)))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    fetched.into_iter().flatten().collect()
}

/// One page fetch. The lease and session release on every exit path,
/// including cancellation mid-navigation.
async fn fetch_one(pool: &BrowserPool, url: &str) -> Option<Page> {
    let lease = match pool.acquire(ACQUIRE_TIMEOUT).await {
        Ok(lease) => lease,
        Err(e) => {
            warn!(url, error = %e, "No browser worker available");
            return None;
        }
    };

    let session = match lease.session().await {
        Ok(session) => session,
        Err(e) => {
            warn!(url, error = %e, "Failed to open browser session");
            return None;
        }
    };

    let result = load_page(&session, url).await;
    session.close().await;

    match result {
        Ok(page) => Some(page),
        Err(e) => {
            warn!(url, error = %e, "Page fetch failed");
            None
        }
    }
}

async fn load_page(session: &BrowserSession, url: &str) -> Result<Page, PoolError> {
    session.goto(url, PAGE_TIMEOUT).await?;
    let text = session.evaluate_string(EXTRACT_TEXT).await?;
    let title = session.title().await?.unwrap_or_default();
    Ok(Page {
        url: url.to_string(),
        title,
        text,
        captured_at: Utc::now(),
    })
}
