use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// Durable tier of the scrape cache. Survives restarts; the fast tier
/// backfills from here.
#[derive(Clone)]
pub struct ScrapeCacheStore {
    pool: PgPool,
}

/// A row from the scraping_cache table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CacheRow {
    pub url_hash: String,
    pub url: String,
    pub body: serde_json::Value,
    pub page_count: i32,
    pub access_count: i32,
    pub scraped_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl ScrapeCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up an unexpired entry. A hit bumps the access counters off the
    /// read path.
    pub async fn get(&self, url_hash: &str) -> Result<Option<CacheRow>> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT * FROM scraping_cache
            WHERE url_hash = $1 AND expires_at > now()
            "#,
        )
        .bind(url_hash)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            let key = url_hash.to_string();
            let pool = self.pool.clone();
            tokio::spawn(async move {
                let _ = sqlx::query(
                    "UPDATE scraping_cache \
                     SET access_count = access_count + 1, last_accessed_at = now() \
                     WHERE url_hash = $1",
                )
                .bind(&key)
                .execute(&pool)
                .await;
            });
        }

        Ok(row)
    }

    /// Upsert an entry. On conflict the body is replaced and the entry's
    /// access count incremented.
    pub async fn put(
        &self,
        url_hash: &str,
        url: &str,
        body: &serde_json::Value,
        page_count: i32,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);

        sqlx::query(
            r#"
            INSERT INTO scraping_cache (url_hash, url, body, page_count, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (url_hash)
            DO UPDATE SET url = EXCLUDED.url,
                          body = EXCLUDED.body,
                          page_count = EXCLUDED.page_count,
                          scraped_at = now(),
                          expires_at = EXCLUDED.expires_at,
                          access_count = scraping_cache.access_count + 1,
                          last_accessed_at = now()
            "#,
        )
        .bind(url_hash)
        .bind(url)
        .bind(body)
        .bind(page_count)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, url_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM scraping_cache WHERE url_hash = $1")
            .bind(url_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete expired entries; returns how many went.
    pub async fn evict_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scraping_cache WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        let evicted = result.rows_affected();
        if evicted > 0 {
            info!(evicted, "Evicted expired scrape cache rows");
        }
        Ok(evicted)
    }
}
