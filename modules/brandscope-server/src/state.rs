use std::sync::Arc;

use sqlx::PgPool;

use brandscope_core::{AppMetrics, Config};
use brandscope_pipeline::PhaseDeps;
use brandscope_store::RequestLog;
use browser_pool::BrowserPool;

use crate::middleware::RateLimiter;

pub struct AppState {
    pub deps: PhaseDeps,
    pub config: Config,
    pub pool: PgPool,
    pub metrics: Arc<AppMetrics>,
    pub browsers: BrowserPool,
    pub rate_limiter: RateLimiter,
    pub request_log: RequestLog,
}
