use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use brandscope_core::types::{CacheTier, ScrapeResult};
use brandscope_core::AppMetrics;
use brandscope_store::ScrapeCacheStore;

use crate::fast_tier::FastTier;

/// Two-tier scrape cache: the DSN-selected fast tier in front of the durable
/// Postgres tier. Reads backfill the fast tier on a durable hit; writes go
/// to both tiers and never propagate failure, since the cache is only an
/// optimization over a full rescrape.
pub struct TwoTierCache {
    fast: FastTier,
    durable: ScrapeCacheStore,
    ttl: Duration,
    metrics: Arc<AppMetrics>,
}

impl TwoTierCache {
    pub fn new(
        fast: FastTier,
        durable: ScrapeCacheStore,
        ttl: Duration,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            fast,
            durable,
            ttl,
            metrics,
        }
    }

    pub async fn get(&self, url_hash: &str) -> Option<Arc<ScrapeResult>> {
        if let Some(hit) = self.fast.get(url_hash).await {
            self.metrics.cache_hit(CacheTier::Fast);
            return Some(hit);
        }
        self.metrics.cache_miss(CacheTier::Fast);

        let row = match self.durable.get(url_hash).await {
            Ok(row) => row,
            Err(e) => {
                warn!(url_hash, error = %e, "Durable cache read failed");
                self.metrics.cache_miss(CacheTier::Durable);
                return None;
            }
        };

        let Some(row) = row else {
            self.metrics.cache_miss(CacheTier::Durable);
            return None;
        };

        self.metrics.cache_hit(CacheTier::Durable);
        match serde_json::from_value::<ScrapeResult>(row.body) {
            Ok(result) => {
                let result = Arc::new(result);
                self.fast.put(url_hash, result.clone(), self.ttl).await;
                Some(result)
            }
            Err(e) => {
                warn!(url_hash, error = %e, "Corrupt cache row, treating as miss");
                None
            }
        }
    }

    pub async fn put(&self, url_hash: &str, url: &str, result: Arc<ScrapeResult>) {
        self.fast.put(url_hash, result.clone(), self.ttl).await;

        let body = match serde_json::to_value(&*result) {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "Failed to encode scrape result for cache");
                return;
            }
        };
        if let Err(e) = self
            .durable
            .put(url_hash, url, &body, result.pages.len() as i32, self.ttl)
            .await
        {
            warn!(url, error = %e, "Durable cache write failed");
        }
    }

    pub async fn invalidate(&self, url_hash: &str) {
        self.fast.remove(url_hash).await;
        if let Err(e) = self.durable.delete(url_hash).await {
            warn!(url_hash, error = %e, "Durable cache delete failed");
        }
    }
}
