use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brandscope_core::{AppMetrics, Config};
use brandscope_pipeline::{spawn_reaper, spawn_run_gauge, EvidenceValidator, PhaseDeps};
use brandscope_scraper::{FastTier, Scraper, TwoTierCache};
use brandscope_store::{RequestLog, RunStore, ScrapeCacheStore};
use browser_pool::BrowserPool;
use llm_client::LlmClient;

mod middleware;
mod rest;
mod state;

use middleware::RateLimiter;
use state::AppState;

const RATE_LIMIT_WINDOW: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("brandscope=info,browser_pool=info,llm_client=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    brandscope_store::migrate(&pool).await?;
    info!("Database migrations applied");

    let metrics = Arc::new(AppMetrics::default());

    let browsers = BrowserPool::launch(config.browser_pool_size, metrics.clone())
        .await
        .map_err(|e| anyhow::anyhow!("browser pool init: {e}"))?;

    let http = reqwest::Client::builder()
        .user_agent(browser_pool::USER_AGENT)
        .build()
        .expect("Failed to build HTTP client");

    let mut llm = LlmClient::new(
        &config.openai_api_key,
        &config.openai_model,
        config.openai_timeout,
        metrics.clone(),
    );
    if let Some(ref base_url) = config.openai_base_url {
        llm = llm.with_base_url(base_url);
    }

    let runs = RunStore::new(pool.clone());
    let fast_tier = FastTier::connect(&config.fast_cache_url).await;
    let cache = TwoTierCache::new(
        fast_tier,
        ScrapeCacheStore::new(pool.clone()),
        config.cache_ttl_scraping,
        metrics.clone(),
    );
    let scraper = Arc::new(Scraper::new(
        browsers.clone(),
        cache,
        http.clone(),
        config.scrape_concurrency,
        metrics.clone(),
    ));

    let deps = PhaseDeps {
        runs: runs.clone(),
        scraper,
        llm: Arc::new(llm),
        validator: EvidenceValidator::new(http),
        metrics: metrics.clone(),
        run_lifetime: chrono::Duration::days(config.run_expiration_days),
    };

    spawn_reaper(
        runs.clone(),
        ScrapeCacheStore::new(pool.clone()),
        RequestLog::new(pool.clone()),
    );
    spawn_run_gauge(runs, metrics.clone());

    let rate_limiter = RateLimiter::new(config.rate_limit_max, RATE_LIMIT_WINDOW);
    let request_log = RequestLog::new(pool.clone());
    let state = Arc::new(AppState {
        deps,
        config: config.clone(),
        pool,
        metrics,
        browsers: browsers.clone(),
        rate_limiter,
        request_log,
    });

    let app = rest::build_app(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr, "brandscope API listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    browsers.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
