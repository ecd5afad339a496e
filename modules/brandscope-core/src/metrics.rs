//! Process-wide metrics registry.
//!
//! Plain atomics and mutex-guarded label maps, rendered to Prometheus text
//! exposition by `render()`. No background collection: every component writes
//! through the shared `Arc<AppMetrics>` at the moment something happens.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::types::CacheTier;

#[derive(Debug, Default, Clone, Copy)]
struct DurationStats {
    count: u64,
    sum_ms: u64,
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    cache_hits_fast: AtomicU64,
    cache_hits_durable: AtomicU64,
    cache_misses_fast: AtomicU64,
    cache_misses_durable: AtomicU64,

    pool_total: AtomicU64,
    pool_in_use: AtomicU64,
    pool_available: AtomicU64,

    active_runs: AtomicU64,

    // (model, endpoint, status) → call count
    openai_calls: Mutex<BTreeMap<(String, String, String), u64>>,
    // (model, endpoint) → total tokens
    openai_tokens: Mutex<BTreeMap<(String, String), u64>>,
    // domain → duration stats
    scrape_durations: Mutex<BTreeMap<String, DurationStats>>,
    // (path, status) → request count
    http_requests: Mutex<BTreeMap<(String, u16), u64>>,
}

impl AppMetrics {
    pub fn cache_hit(&self, tier: CacheTier) {
        match tier {
            CacheTier::Fast => self.cache_hits_fast.fetch_add(1, Ordering::Relaxed),
            CacheTier::Durable => self.cache_hits_durable.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn cache_miss(&self, tier: CacheTier) {
        match tier {
            CacheTier::Fast => self.cache_misses_fast.fetch_add(1, Ordering::Relaxed),
            CacheTier::Durable => self.cache_misses_durable.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn cache_hits(&self, tier: CacheTier) -> u64 {
        match tier {
            CacheTier::Fast => self.cache_hits_fast.load(Ordering::Relaxed),
            CacheTier::Durable => self.cache_hits_durable.load(Ordering::Relaxed),
        }
    }

    pub fn set_pool_gauges(&self, total: u64, in_use: u64, available: u64) {
        self.pool_total.store(total, Ordering::Relaxed);
        self.pool_in_use.store(in_use, Ordering::Relaxed);
        self.pool_available.store(available, Ordering::Relaxed);
    }

    pub fn set_active_runs(&self, count: u64) {
        self.active_runs.store(count, Ordering::Relaxed);
    }

    pub fn record_openai_call(&self, model: &str, endpoint: &str, status: &str) {
        let mut calls = self.openai_calls.lock().expect("metrics mutex poisoned");
        *calls
            .entry((model.to_string(), endpoint.to_string(), status.to_string()))
            .or_default() += 1;
    }

    pub fn add_openai_tokens(&self, model: &str, endpoint: &str, tokens: u64) {
        let mut totals = self.openai_tokens.lock().expect("metrics mutex poisoned");
        *totals
            .entry((model.to_string(), endpoint.to_string()))
            .or_default() += tokens;
    }

    pub fn observe_scrape_duration(&self, domain: &str, duration_ms: u64) {
        let mut durations = self.scrape_durations.lock().expect("metrics mutex poisoned");
        let stats = durations.entry(domain.to_string()).or_default();
        stats.count += 1;
        stats.sum_ms += duration_ms;
    }

    pub fn scrape_observations(&self, domain: &str) -> u64 {
        self.scrape_durations
            .lock()
            .expect("metrics mutex poisoned")
            .get(domain)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    pub fn record_http(&self, path: &str, status: u16) {
        let mut requests = self.http_requests.lock().expect("metrics mutex poisoned");
        *requests.entry((path.to_string(), status)).or_default() += 1;
    }

    /// Render every series as Prometheus text exposition (version 0.0.4).
    pub fn render(&self) -> String {
        let mut body = String::with_capacity(2048);

        for (tier, hits, misses) in [
            (
                "fast",
                self.cache_hits_fast.load(Ordering::Relaxed),
                self.cache_misses_fast.load(Ordering::Relaxed),
            ),
            (
                "durable",
                self.cache_hits_durable.load(Ordering::Relaxed),
                self.cache_misses_durable.load(Ordering::Relaxed),
            ),
        ] {
            body.push_str(&format!("cache_hits_total{{tier=\"{tier}\"}} {hits}\n"));
            body.push_str(&format!("cache_misses_total{{tier=\"{tier}\"}} {misses}\n"));
        }

        body.push_str(&format!(
            "browser_pool_total {}\n",
            self.pool_total.load(Ordering::Relaxed)
        ));
        body.push_str(&format!(
            "browser_pool_in_use {}\n",
            self.pool_in_use.load(Ordering::Relaxed)
        ));
        body.push_str(&format!(
            "browser_pool_available {}\n",
            self.pool_available.load(Ordering::Relaxed)
        ));
        body.push_str(&format!(
            "active_runs {}\n",
            self.active_runs.load(Ordering::Relaxed)
        ));

        for ((model, endpoint, status), count) in
            self.openai_calls.lock().expect("metrics mutex poisoned").iter()
        {
            body.push_str(&format!(
                "openai_api_calls_total{{model=\"{model}\",endpoint=\"{endpoint}\",status=\"{status}\"}} {count}\n"
            ));
        }
        for ((model, endpoint), tokens) in
            self.openai_tokens.lock().expect("metrics mutex poisoned").iter()
        {
            body.push_str(&format!(
                "openai_tokens_used_total{{model=\"{model}\",endpoint=\"{endpoint}\"}} {tokens}\n"
            ));
        }

        for (domain, stats) in self.scrape_durations.lock().expect("metrics mutex poisoned").iter() {
            body.push_str(&format!(
                "scraping_duration_ms_count{{domain=\"{domain}\"}} {}\n",
                stats.count
            ));
            body.push_str(&format!(
                "scraping_duration_ms_sum{{domain=\"{domain}\"}} {}\n",
                stats.sum_ms
            ));
        }

        for ((path, status), count) in
            self.http_requests.lock().expect("metrics mutex poisoned").iter()
        {
            body.push_str(&format!(
                "http_requests_total{{path=\"{path}\",status=\"{status}\"}} {count}\n"
            ));
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_counters_track_per_tier() {
        let metrics = AppMetrics::default();
        metrics.cache_hit(CacheTier::Fast);
        metrics.cache_hit(CacheTier::Fast);
        metrics.cache_miss(CacheTier::Durable);
        assert_eq!(metrics.cache_hits(CacheTier::Fast), 2);
        assert_eq!(metrics.cache_hits(CacheTier::Durable), 0);

        let body = metrics.render();
        assert!(body.contains("cache_hits_total{tier=\"fast\"} 2"));
        assert!(body.contains("cache_misses_total{tier=\"durable\"} 1"));
    }

    #[test]
    fn openai_series_carry_all_labels() {
        let metrics = AppMetrics::default();
        metrics.record_openai_call("gpt-4o-mini", "brand-analysis", "200");
        metrics.record_openai_call("gpt-4o-mini", "brand-analysis", "200");
        metrics.record_openai_call("gpt-4o-mini", "brand-analysis", "timeout");
        metrics.add_openai_tokens("gpt-4o-mini", "brand-analysis", 1234);

        let body = metrics.render();
        assert!(body.contains(
            "openai_api_calls_total{model=\"gpt-4o-mini\",endpoint=\"brand-analysis\",status=\"200\"} 2"
        ));
        assert!(body.contains(
            "openai_api_calls_total{model=\"gpt-4o-mini\",endpoint=\"brand-analysis\",status=\"timeout\"} 1"
        ));
        assert!(body.contains(
            "openai_tokens_used_total{model=\"gpt-4o-mini\",endpoint=\"brand-analysis\"} 1234"
        ));
    }

    #[test]
    fn scrape_durations_accumulate_count_and_sum() {
        let metrics = AppMetrics::default();
        metrics.observe_scrape_duration("allbirds.com", 1500);
        metrics.observe_scrape_duration("allbirds.com", 500);
        assert_eq!(metrics.scrape_observations("allbirds.com"), 2);
        assert_eq!(metrics.scrape_observations("other.com"), 0);

        let body = metrics.render();
        assert!(body.contains("scraping_duration_ms_count{domain=\"allbirds.com\"} 2"));
        assert!(body.contains("scraping_duration_ms_sum{domain=\"allbirds.com\"} 2000"));
    }

    #[test]
    fn pool_gauges_overwrite_not_accumulate() {
        let metrics = AppMetrics::default();
        metrics.set_pool_gauges(3, 1, 2);
        metrics.set_pool_gauges(3, 0, 3);
        let body = metrics.render();
        assert!(body.contains("browser_pool_total 3"));
        assert!(body.contains("browser_pool_in_use 0"));
        assert!(body.contains("browser_pool_available 3"));
    }
}
