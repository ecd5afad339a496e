// Fast tier of the scrape cache, selected by the configured DSN. A redis://
// DSN gets the network backend; memory:// gets the in-process map. Every
// failure on this tier reads as a miss and is logged, never propagated.

use std::sync::Arc;
use std::time::Duration;

use redis::AsyncCommands;
use tracing::{info, warn};

use brandscope_core::types::ScrapeResult;

use crate::fast_cache::FastCache;

/// Per-operation budget for the network backend. The fast tier must stay
/// fast; a slow answer is worth less than falling through to the durable
/// tier.
const REDIS_OP_TIMEOUT: Duration = Duration::from_millis(250);

const KEY_PREFIX: &str = "scrape:";

fn redis_key(url_hash: &str) -> String {
    format!("{KEY_PREFIX}{url_hash}")
}

pub enum FastTier {
    Memory(FastCache),
    Redis(RedisTier),
}

impl FastTier {
    /// Build the tier the DSN selects. A redis DSN that does not answer the
    /// startup probe degrades to the in-process map with a warning; an
    /// unavailable fast tier at startup is not an error.
    pub async fn connect(dsn: &str) -> Self {
        if dsn.starts_with("redis://") || dsn.starts_with("rediss://") {
            match RedisTier::connect(dsn).await {
                Ok(tier) => {
                    info!("Fast cache tier: redis");
                    return FastTier::Redis(tier);
                }
                Err(e) => {
                    warn!(error = %e, "Fast cache unreachable, using in-process tier");
                }
            }
        } else {
            info!("Fast cache tier: in-process");
        }
        FastTier::Memory(FastCache::default())
    }

    pub async fn get(&self, url_hash: &str) -> Option<Arc<ScrapeResult>> {
        match self {
            FastTier::Memory(cache) => cache.get(url_hash),
            FastTier::Redis(tier) => tier.get(url_hash).await,
        }
    }

    pub async fn put(&self, url_hash: &str, body: Arc<ScrapeResult>, ttl: Duration) {
        match self {
            FastTier::Memory(cache) => cache.put(url_hash, body, ttl),
            FastTier::Redis(tier) => tier.put(url_hash, &body, ttl).await,
        }
    }

    pub async fn remove(&self, url_hash: &str) {
        match self {
            FastTier::Memory(cache) => cache.remove(url_hash),
            FastTier::Redis(tier) => tier.remove(url_hash).await,
        }
    }
}

/// Network fast tier: JSON payloads under TTL'd keys.
pub struct RedisTier {
    client: redis::Client,
}

impl RedisTier {
    async fn connect(dsn: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(dsn)?;
        // Probe once so a dead DSN surfaces at startup instead of on the
        // first scrape.
        let probe = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            conn.get::<_, Option<String>>(redis_key("startup-probe")).await
        };
        tokio::time::timeout(REDIS_OP_TIMEOUT, probe)
            .await
            .map_err(|_| anyhow::anyhow!("probe timed out"))??;
        Ok(Self { client })
    }

    async fn get(&self, url_hash: &str) -> Option<Arc<ScrapeResult>> {
        let lookup = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.get::<_, Option<String>>(redis_key(url_hash)).await
        };
        let payload = match tokio::time::timeout(REDIS_OP_TIMEOUT, lookup).await {
            Ok(Ok(payload)) => payload?,
            Ok(Err(e)) => {
                warn!(url_hash, error = %e, "Fast tier read failed");
                return None;
            }
            Err(_) => {
                warn!(url_hash, "Fast tier read timed out");
                return None;
            }
        };
        match serde_json::from_str::<ScrapeResult>(&payload) {
            Ok(result) => Some(Arc::new(result)),
            Err(e) => {
                warn!(url_hash, error = %e, "Corrupt fast tier entry, treating as miss");
                None
            }
        }
    }

    async fn put(&self, url_hash: &str, body: &ScrapeResult, ttl: Duration) {
        let payload = match serde_json::to_string(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(url_hash, error = %e, "Failed to encode fast tier entry");
                return;
            }
        };
        let write = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.set_ex::<_, _, ()>(redis_key(url_hash), payload, ttl.as_secs())
                .await
        };
        match tokio::time::timeout(REDIS_OP_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(url_hash, error = %e, "Fast tier write failed"),
            Err(_) => warn!(url_hash, "Fast tier write timed out"),
        }
    }

    async fn remove(&self, url_hash: &str) {
        let delete = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.del::<_, ()>(redis_key(url_hash)).await
        };
        match tokio::time::timeout(REDIS_OP_TIMEOUT, delete).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(url_hash, error = %e, "Fast tier delete failed"),
            Err(_) => warn!(url_hash, "Fast tier delete timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_dsn_selects_the_in_process_tier() {
        let tier = FastTier::connect("memory://").await;
        assert!(matches!(tier, FastTier::Memory(_)));
    }

    #[tokio::test]
    async fn in_process_tier_round_trips_through_the_enum() {
        let tier = FastTier::connect("memory://").await;
        let body = Arc::new(ScrapeResult {
            pages: Vec::new(),
            meta: brandscope_core::types::ScrapeMeta {
                input_url: "https://a.com/".into(),
                domain: "a.com".into(),
                candidates_discovered: 0,
                candidates_alive: 0,
                pages_scraped: 0,
                pages_after_dedup: 0,
                duration_ms: 0,
                captured_at: chrono::Utc::now(),
            },
        });
        tier.put("k", body, Duration::from_secs(60)).await;
        assert!(tier.get("k").await.is_some());
        tier.remove("k").await;
        assert!(tier.get("k").await.is_none());
    }

    #[test]
    fn redis_keys_are_namespaced() {
        assert_eq!(redis_key("abc"), "scrape:abc");
    }
}
