mod phases;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use brandscope_core::types::InvalidEvidence;
use brandscope_pipeline::PhaseError;

use crate::middleware;
use crate::state::AppState;

/// Error envelope: `{error, message, details?, correlationId}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: ErrorBody {
                error: code.into(),
                message: message.into(),
                details: None,
                correlation_id: correlation_id.into(),
            },
        }
    }

    pub fn from_phase(error: &PhaseError, correlation_id: impl Into<String>) -> Self {
        let details = match error {
            PhaseError::LowConfidence {
                confidence,
                invalid,
            } => Some(low_confidence_details(*confidence, invalid)),
            _ => None,
        };
        let mut api = Self::new(
            error.http_status(),
            error.code(),
            error.to_string(),
            correlation_id,
        );
        api.body.details = details;
        api
    }
}

fn low_confidence_details(confidence: f64, invalid: &[InvalidEvidence]) -> serde_json::Value {
    serde_json::json!({
        "confidence_0_1": confidence,
        "invalid_citations": invalid,
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-request-id"),
        ]);

    let phase_routes = Router::new()
        .route("/v1/brand-summary", post(phases::brand_summary))
        .route("/v1/competitors", post(phases::competitors))
        .route("/v1/competitors/analyze", post(phases::competitors_analyze))
        .route("/v1/kernel", post(phases::kernel))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/health/live", get(live));

    // Everything except /metrics sits behind the per-(ip, key) rate limit.
    let limited = phase_routes.merge(health_routes).layer(
        axum::middleware::from_fn_with_state(state.clone(), middleware::enforce_rate_limit),
    );

    Router::new()
        .merge(limited)
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum::middleware::from_fn(middleware::request_id))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::record_request,
                )),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Subsystems {
    database: &'static str,
    browser_pool: &'static str,
    llm: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    subsystems: Subsystems,
}

fn up(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "unavailable"
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let pool_stats = state.browsers.stats();
    let browser_pool = pool_stats.initialized && pool_stats.total > 0;
    let llm = !state.config.openai_api_key.is_empty();

    let healthy = database && browser_pool && llm;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthBody {
            status: if healthy { "ok" } else { "degraded" },
            subsystems: Subsystems {
                database: up(database),
                browser_pool: up(browser_pool),
                llm: up(llm),
            },
        }),
    )
}

async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let ready = database && state.browsers.stats().initialized;
    if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
