//! Background maintenance loops: run reaping, cache eviction, request-log
//! pruning, and run-count gauge publication.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use brandscope_core::AppMetrics;
use brandscope_store::{RequestLog, RunStore, ScrapeCacheStore};

const REAP_INTERVAL: Duration = Duration::from_secs(3600);
const GAUGE_INTERVAL: Duration = Duration::from_secs(60);
const REQUEST_LOG_RETENTION_DAYS: i32 = 30;

/// Hourly cleanup pass: expired runs (archived ones kept), expired cache
/// rows, request-log rows past retention.
pub fn spawn_reaper(
    runs: RunStore,
    cache: ScrapeCacheStore,
    request_log: RequestLog,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REAP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            match runs.reap_expired().await {
                Ok(reaped) if reaped > 0 => info!(reaped, "Expired runs reaped"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Run reap failed"),
            }

            if let Err(e) = cache.evict_expired().await {
                warn!(error = %e, "Cache eviction failed");
            }

            match request_log
                .prune_older_than_days(REQUEST_LOG_RETENTION_DAYS)
                .await
            {
                Ok(pruned) if pruned > 0 => info!(pruned, "Old request-log rows pruned"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Request-log prune failed"),
            }
        }
    })
}

/// Publish the active-run count gauge on a 60-second cadence.
pub fn spawn_run_gauge(runs: RunStore, metrics: Arc<AppMetrics>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(GAUGE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match runs.count_active().await {
                Ok(count) => metrics.set_active_runs(count.max(0) as u64),
                Err(e) => warn!(error = %e, "Active-run count failed"),
            }
        }
    })
}
