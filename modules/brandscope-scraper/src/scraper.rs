use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;

use browser_pool::BrowserPool;

use brandscope_core::helpers::{domain_of, url_hash};
use brandscope_core::types::{ScrapeMeta, ScrapeResult};
use brandscope_core::AppMetrics;

use crate::canonical::canonicalize;
use crate::error::{Result, ScrapeError};
use crate::two_tier::TwoTierCache;
use crate::{dedupe, discover, fetch, probe};

/// Cache-interposed scrape pipeline:
/// canonicalize → discover → probe → fetch → dedupe → cache.
pub struct Scraper {
    pool: BrowserPool,
    cache: TwoTierCache,
    http: reqwest::Client,
    concurrency: usize,
    metrics: Arc<AppMetrics>,
}

impl Scraper {
    pub fn new(
        pool: BrowserPool,
        cache: TwoTierCache,
        http: reqwest::Client,
        concurrency: usize,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            pool,
            cache,
            http,
            concurrency,
            metrics,
        }
    }

    /// Scrape a brand site. A cache hit returns without touching the browser
    /// pool and without a duration observation.
    pub async fn scrape(&self, input_url: &str) -> Result<Arc<ScrapeResult>> {
        let canonical = canonicalize(input_url)?;
        let key = url_hash(canonical.as_str());

        if let Some(hit) = self.cache.get(&key).await {
            info!(url = %canonical, pages = hit.pages.len(), "Scrape served from cache");
            return Ok(hit);
        }

        let started = Instant::now();
        let domain = domain_of(canonical.as_str()).unwrap_or_default();

        let candidates = discover::candidates(&canonical);
        let alive = probe::probe_candidates(&self.http, &candidates).await;
        info!(
            domain,
            discovered = candidates.len(),
            alive = alive.len(),
            "Candidate probing complete"
        );
        if alive.is_empty() {
            return Err(ScrapeError::InsufficientData(
                "no candidate URL answered the probe".to_string(),
            ));
        }

        let fetched = fetch::fetch_pages(&self.pool, &alive, self.concurrency).await;
        if fetched.is_empty() {
            return Err(ScrapeError::InsufficientData(
                "no page could be fetched".to_string(),
            ));
        }

        let pages_scraped = fetched.len();
        let pages = dedupe::dedupe_pages(fetched);
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = Arc::new(ScrapeResult {
            meta: ScrapeMeta {
                input_url: canonical.to_string(),
                domain: domain.clone(),
                candidates_discovered: candidates.len(),
                candidates_alive: alive.len(),
                pages_scraped,
                pages_after_dedup: pages.len(),
                duration_ms,
                captured_at: Utc::now(),
            },
            pages,
        });

        self.cache.put(&key, canonical.as_str(), result.clone()).await;
        self.metrics.observe_scrape_duration(&domain, duration_ms);
        info!(
            domain,
            pages = result.pages.len(),
            duration_ms,
            "Scrape complete"
        );

        Ok(result)
    }
}
