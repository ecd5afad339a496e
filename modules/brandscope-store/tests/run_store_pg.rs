//! Run-store semantics against a real Postgres.
//! Run with: DATABASE_URL=postgres://... cargo test -p brandscope-store -- --ignored

use chrono::Duration;

use brandscope_core::types::BrandAnalysis;
use brandscope_store::{migrate, RunStore, StoreError};

async fn connect() -> sqlx::PgPool {
    let dsn = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = sqlx::PgPool::connect(&dsn).await.expect("connect");
    migrate(&pool).await.expect("migrations");
    pool
}

fn brand(name: &str) -> BrandAnalysis {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "domain": "example.com",
        "confidence_0_1": 0.8,
        "evidence_refs": ["https://example.com/about"]
    }))
    .expect("brand fixture")
}

#[tokio::test]
#[ignore] // requires Postgres
async fn save_then_get_round_trips_the_brand_slot() {
    let store = RunStore::new(connect().await);

    let run = store
        .create(Duration::days(7), serde_json::json!({}))
        .await
        .expect("create");
    assert!(run.run_id.starts_with("run_"));
    assert!(run.brand.is_none());

    let saved = brand("Allbirds");
    store.save_brand(&run.run_id, &saved).await.expect("save");

    let loaded = store.get(&run.run_id).await.expect("get");
    let loaded_brand = loaded.brand.expect("brand slot");
    assert_eq!(loaded_brand.name, "Allbirds");
    assert_eq!(loaded_brand.evidence_refs, saved.evidence_refs);
    assert!(loaded.updated_at >= run.updated_at);
}

#[tokio::test]
#[ignore] // requires Postgres
async fn unknown_run_reads_and_writes_as_not_found() {
    let store = RunStore::new(connect().await);

    let err = store.get("run_00000000-0000-0000-0000-000000000000").await;
    assert!(matches!(err, Err(StoreError::RunNotFound(_))));

    let err = store
        .save_brand("run_00000000-0000-0000-0000-000000000000", &brand("Ghost"))
        .await;
    assert!(matches!(err, Err(StoreError::RunNotFound(_))));
}

#[tokio::test]
#[ignore] // requires Postgres
async fn expired_runs_are_invisible_then_reaped() {
    let store = RunStore::new(connect().await);

    let run = store
        .create(Duration::seconds(-1), serde_json::json!({}))
        .await
        .expect("create already-expired run");

    let err = store.get(&run.run_id).await;
    assert!(matches!(err, Err(StoreError::RunNotFound(_))));

    let reaped = store.reap_expired().await.expect("reap");
    assert!(reaped >= 1);
}
