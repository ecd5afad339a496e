use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use brandscope_core::types::ScrapeResult;

struct FastEntry {
    body: Arc<ScrapeResult>,
    expires_at: Instant,
}

/// In-process fast tier backend. Volatile by construction: empty at every
/// startup, which is normal, not an error.
#[derive(Default)]
pub struct FastCache {
    entries: RwLock<HashMap<String, FastEntry>>,
}

impl FastCache {
    pub fn get(&self, key: &str) -> Option<Arc<ScrapeResult>> {
        {
            let entries = self.entries.read().expect("fast cache lock poisoned");
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.body.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but expired: drop it under the write lock.
        self.entries
            .write()
            .expect("fast cache lock poisoned")
            .remove(key);
        None
    }

    pub fn put(&self, key: &str, body: Arc<ScrapeResult>, ttl: Duration) {
        self.entries.write().expect("fast cache lock poisoned").insert(
            key.to_string(),
            FastEntry {
                body,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .expect("fast cache lock poisoned")
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result() -> Arc<ScrapeResult> {
        Arc::new(ScrapeResult {
            pages: Vec::new(),
            meta: brandscope_core::types::ScrapeMeta {
                input_url: "https://a.com/".into(),
                domain: "a.com".into(),
                candidates_discovered: 0,
                candidates_alive: 0,
                pages_scraped: 0,
                pages_after_dedup: 0,
                duration_ms: 0,
                captured_at: Utc::now(),
            },
        })
    }

    #[test]
    fn put_then_get_within_ttl() {
        let cache = FastCache::default();
        cache.put("k", result(), Duration::from_secs(60));
        assert!(cache.get("k").is_some());
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn expired_entries_read_as_misses() {
        let cache = FastCache::default();
        cache.put("k", result(), Duration::from_secs(0));
        assert!(cache.get("k").is_none());
        // And the expired entry was pruned, not just hidden.
        assert!(cache
            .entries
            .read()
            .expect("lock")
            .is_empty());
    }

    #[test]
    fn remove_clears_the_key() {
        let cache = FastCache::default();
        cache.put("k", result(), Duration::from_secs(60));
        cache.remove("k");
        assert!(cache.get("k").is_none());
    }
}
