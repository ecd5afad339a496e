//! Postgres persistence: pipeline runs, the durable scrape-cache tier, and
//! the API request log.

mod cache;
mod error;
mod request_log;
mod runs;

pub use cache::{CacheRow, ScrapeCacheStore};
pub use error::{Result, StoreError};
pub use request_log::{RequestLog, RequestRecord};
pub use runs::RunStore;

use sqlx::PgPool;

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;
    Ok(())
}
