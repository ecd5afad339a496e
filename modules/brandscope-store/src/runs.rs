use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use brandscope_core::types::{
    BrandAnalysis, CompetitorAnalysis, CompetitorCandidate, Kernel, Run, RunStatus,
};

use crate::error::{Result, StoreError};

/// Durable store for pipeline runs. Artifact slots are written once per
/// phase; a rewrite replaces the slot in a single row update.
#[derive(Clone)]
pub struct RunStore {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RunRow {
    run_id: String,
    brand: Option<serde_json::Value>,
    competitors_ten: Option<serde_json::Value>,
    competitors_analyzed: Option<serde_json::Value>,
    kernel: Option<serde_json::Value>,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl RunRow {
    fn into_run(self) -> Result<Run> {
        Ok(Run {
            run_id: self.run_id,
            brand: self.brand.map(serde_json::from_value).transpose()?,
            competitors_ten: self.competitors_ten.map(serde_json::from_value).transpose()?,
            competitors_analyzed: self
                .competitors_analyzed
                .map(serde_json::from_value)
                .transpose()?,
            kernel: self.kernel.map(serde_json::from_value).transpose()?,
            status: RunStatus::parse(&self.status).unwrap_or(RunStatus::Active),
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
        })
    }
}

impl RunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a run with a fresh `run_` identifier and the given lifetime.
    pub async fn create(&self, lifetime: Duration, metadata: serde_json::Value) -> Result<Run> {
        let run_id = format!("run_{}", Uuid::new_v4());
        let expires_at = Utc::now() + lifetime;

        let row = sqlx::query_as::<_, RunRow>(
            r#"
            INSERT INTO runs (run_id, expires_at, metadata)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&run_id)
        .bind(expires_at)
        .bind(&metadata)
        .fetch_one(&self.pool)
        .await?;

        row.into_run()
    }

    /// Fetch an active, unexpired run. Expired or missing runs read the same:
    /// not found.
    pub async fn get(&self, run_id: &str) -> Result<Run> {
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT * FROM runs
            WHERE run_id = $1 AND status = 'active' AND expires_at > now()
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?
            .into_run()
    }

    pub async fn save_brand(&self, run_id: &str, brand: &BrandAnalysis) -> Result<()> {
        self.save_slot(run_id, "brand", serde_json::to_value(brand)?).await
    }

    pub async fn save_competitors(
        &self,
        run_id: &str,
        competitors: &[CompetitorCandidate],
    ) -> Result<()> {
        self.save_slot(run_id, "competitors_ten", serde_json::to_value(competitors)?)
            .await
    }

    pub async fn save_analyzed(
        &self,
        run_id: &str,
        analyzed: &[CompetitorAnalysis],
    ) -> Result<()> {
        self.save_slot(
            run_id,
            "competitors_analyzed",
            serde_json::to_value(analyzed)?,
        )
        .await
    }

    pub async fn save_kernel(&self, run_id: &str, kernel: &Kernel) -> Result<()> {
        self.save_slot(run_id, "kernel", serde_json::to_value(kernel)?).await
    }

    /// Replace one artifact slot atomically and bump `updated_at`. A write
    /// against a missing, expired, or non-active run is a not-found error,
    /// never an insert.
    async fn save_slot(
        &self,
        run_id: &str,
        column: &'static str,
        value: serde_json::Value,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE runs SET {column} = $2, updated_at = now() \
             WHERE run_id = $1 AND status = 'active' AND expires_at > now()"
        );
        let result = sqlx::query(&sql)
            .bind(run_id)
            .bind(&value)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RunNotFound(run_id.to_string()));
        }
        Ok(())
    }

    /// Active, unexpired run count (published as a gauge).
    pub async fn count_active(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM runs WHERE status = 'active' AND expires_at > now()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Delete runs past their deadline, archived runs excepted.
    pub async fn reap_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM runs WHERE expires_at <= now() AND status <> 'archived'",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> RunRow {
        RunRow {
            run_id: format!("run_{}", Uuid::new_v4()),
            brand: Some(serde_json::json!({"name": "Acme", "confidence_0_1": 0.9})),
            competitors_ten: None,
            competitors_analyzed: None,
            kernel: None,
            status: status.to_string(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[test]
    fn run_row_decodes_typed_artifacts() {
        let run = row("active").into_run().expect("row should decode");
        let brand = run.brand.expect("brand slot populated");
        assert_eq!(brand.name, "Acme");
        assert_eq!(run.status, RunStatus::Active);
        assert!(run.competitors_ten.is_none());
    }

    #[test]
    fn run_row_with_corrupt_artifact_errors() {
        let mut bad = row("active");
        bad.brand = Some(serde_json::json!([1, 2, 3]));
        assert!(bad.into_run().is_err());
    }

    #[test]
    fn fresh_run_ids_match_the_public_pattern() {
        let run_id = format!("run_{}", Uuid::new_v4());
        assert!(run_id.starts_with("run_"));
        assert!(run_id[4..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase() || c == '-'));
    }
}
