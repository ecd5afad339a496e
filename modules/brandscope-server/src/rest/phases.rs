use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Extension, Json};
use regex::Regex;
use serde::Deserialize;

use brandscope_pipeline::{
    brand_summary as brand_summary_phase, competitors as competitors_phase,
    competitors_analyze as analyze_phase, kernel as kernel_phase, BrandSummaryOutcome,
    CompetitorsAnalyzeOutcome, CompetitorsOutcome, KernelOutcome,
};

use crate::middleware::RequestId;
use crate::rest::ApiError;
use crate::state::AppState;

/// `/v1/competitors/analyze` accepts between 1 and 10 domains.
const MAX_ANALYZE_DOMAINS: usize = 10;

#[derive(Debug, Deserialize)]
pub(super) struct BrandSummaryRequest {
    brand_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompetitorsRequest {
    run_id: String,
    // Accepted for wire compatibility; the stored brand is authoritative.
    #[serde(default, rename = "brand_domain")]
    _brand_domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    run_id: String,
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct KernelRequest {
    run_id: String,
}

fn valid_run_id(run_id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^run_[a-f0-9-]+$").expect("valid regex"))
        .is_match(run_id)
}

fn domains_in_bounds(domains: &[String]) -> bool {
    !domains.is_empty() && domains.len() <= MAX_ANALYZE_DOMAINS
}

fn bad_request(message: impl Into<String>, correlation: &str) -> ApiError {
    ApiError::new(400, "VALIDATION_ERROR", message, correlation)
}

fn unpack<T>(
    body: Result<Json<T>, JsonRejection>,
    correlation: &str,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(bad_request(rejection.to_string(), correlation)),
    }
}

fn require_run_id(run_id: &str, correlation: &str) -> Result<(), ApiError> {
    if valid_run_id(run_id) {
        Ok(())
    } else {
        Err(bad_request(format!("malformed run_id: {run_id}"), correlation))
    }
}

/// Run a phase under the per-request deadline. On expiry the phase future is
/// dropped, which unwinds its leases and skips any pending artifact write.
async fn with_deadline<T>(
    state: &AppState,
    correlation: &str,
    phase: impl Future<Output = brandscope_pipeline::Result<T>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(state.config.request_timeout, phase).await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(ApiError::from_phase(&e, correlation)),
        Err(_) => Err(ApiError::new(
            504,
            "REQUEST_TIMEOUT",
            "request exceeded the configured deadline",
            correlation,
        )),
    }
}

#[axum::debug_handler]
pub(super) async fn brand_summary(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(correlation)): Extension<RequestId>,
    body: Result<Json<BrandSummaryRequest>, JsonRejection>,
) -> Result<Json<BrandSummaryOutcome>, ApiError> {
    let request = unpack(body, &correlation)?;
    let phase: Pin<Box<dyn Future<Output = brandscope_pipeline::Result<BrandSummaryOutcome>> + Send + '_>> =
        Box::pin(brand_summary_phase::run(&state.deps, &request.brand_url));
    let outcome = with_deadline(&state, &correlation, phase).await?;
    Ok(Json(outcome))
}

pub(super) async fn competitors(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(correlation)): Extension<RequestId>,
    body: Result<Json<CompetitorsRequest>, JsonRejection>,
) -> Result<Json<CompetitorsOutcome>, ApiError> {
    let request = unpack(body, &correlation)?;
    require_run_id(&request.run_id, &correlation)?;
    let outcome = with_deadline(
        &state,
        &correlation,
        competitors_phase::run(&state.deps, &request.run_id),
    )
    .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub(super) async fn competitors_analyze(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(correlation)): Extension<RequestId>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<CompetitorsAnalyzeOutcome>, ApiError> {
    let request = unpack(body, &correlation)?;
    require_run_id(&request.run_id, &correlation)?;
    if !domains_in_bounds(&request.domains) {
        return Err(bad_request(
            format!(
                "domains must contain between 1 and {MAX_ANALYZE_DOMAINS} entries, got {}",
                request.domains.len()
            ),
            &correlation,
        ));
    }
    let outcome = with_deadline(
        &state,
        &correlation,
        analyze_phase::run(&state.deps, &request.run_id, &request.domains),
    )
    .await?;
    Ok(Json(outcome))
}

pub(super) async fn kernel(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(correlation)): Extension<RequestId>,
    body: Result<Json<KernelRequest>, JsonRejection>,
) -> Result<Json<KernelOutcome>, ApiError> {
    let request = unpack(body, &correlation)?;
    require_run_id(&request.run_id, &correlation)?;
    let outcome = with_deadline(
        &state,
        &correlation,
        kernel_phase::run(&state.deps, &request.run_id),
    )
    .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_pattern_accepts_uuids() {
        assert!(valid_run_id(
            "run_6fa459ea-ee8a-3ca4-894e-db77e160355e"
        ));
        assert!(valid_run_id("run_abc123"));
    }

    #[test]
    fn run_id_pattern_rejects_everything_else() {
        for bad in [
            "run_",
            "run_XYZ",
            "6fa459ea-ee8a-3ca4-894e-db77e160355e",
            "run_abc123!",
            "RUN_abc123",
            "",
        ] {
            assert!(!valid_run_id(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn analyze_accepts_one_through_ten_domains() {
        let domains = |n: usize| -> Vec<String> { (0..n).map(|i| format!("c{i}.com")).collect() };
        assert!(!domains_in_bounds(&domains(0)));
        assert!(domains_in_bounds(&domains(1)));
        assert!(domains_in_bounds(&domains(10)));
        assert!(!domains_in_bounds(&domains(11)));
    }
}
