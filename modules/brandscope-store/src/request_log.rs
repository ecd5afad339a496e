use sqlx::PgPool;
use tracing::warn;

use crate::error::Result;

/// Per-request audit row for the API surface.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status: i16,
    pub duration_ms: i32,
    pub client_ip: Option<String>,
}

/// Request log writer. Logs a warning on failure rather than propagating;
/// a failed audit write must never affect the request it describes.
#[derive(Clone)]
pub struct RequestLog {
    pool: PgPool,
}

impl RequestLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, record: RequestRecord) {
        let result = sqlx::query(
            r#"
            INSERT INTO api_metrics (request_id, method, path, status, duration_ms, client_ip)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.request_id)
        .bind(&record.method)
        .bind(&record.path)
        .bind(record.status)
        .bind(record.duration_ms)
        .bind(&record.client_ip)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(path = %record.path, error = %e, "Failed to record API request");
        }
    }

    /// Drop rows older than the retention window; returns how many went.
    pub async fn prune_older_than_days(&self, days: i32) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM api_metrics WHERE created_at < now() - make_interval(days => $1)",
        )
        .bind(days)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
