use brandscope_core::types::InvalidEvidence;
use brandscope_scraper::ScrapeError;
use brandscope_store::StoreError;
use llm_client::LlmError;

/// Result type alias for phase handlers.
pub type Result<T> = std::result::Result<T, PhaseError>;

/// Reserved error code: declared for API parity, never raised.
pub const EVIDENCE_VIOLATION: &str = "EVIDENCE_VIOLATION";

/// The one error taxonomy every phase surfaces. Each variant maps onto a
/// fixed code string and an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("adjusted confidence {confidence:.3} is below the 0.6 floor")]
    LowConfidence {
        confidence: f64,
        invalid: Vec<InvalidEvidence>,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("required upstream artifact missing: {0}")]
    PrereqMissing(String),

    #[error("llm provider timed out")]
    LlmTimeout,

    #[error("llm provider failed: {0}")]
    Llm(LlmError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PhaseError {
    pub fn code(&self) -> &'static str {
        match self {
            PhaseError::Validation(_) => "VALIDATION_ERROR",
            PhaseError::LowConfidence { .. } => "LOW_CONFIDENCE",
            PhaseError::InsufficientData(_) => "INSUFFICIENT_DATA",
            PhaseError::PrereqMissing(_) => "UPSTREAM_ARTIFACT_MISSING",
            PhaseError::LlmTimeout => "OPENAI_TIMEOUT",
            PhaseError::Llm(_) => "OPENAI_ERROR",
            PhaseError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            PhaseError::Validation(_) => 400,
            PhaseError::LowConfidence { .. } => 422,
            PhaseError::InsufficientData(_) => 424,
            PhaseError::PrereqMissing(_) => 424,
            PhaseError::LlmTimeout => 504,
            PhaseError::Llm(_) => 503,
            PhaseError::Internal(_) => 500,
        }
    }
}

impl From<ScrapeError> for PhaseError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::Validation(message) => PhaseError::Validation(message),
            ScrapeError::InsufficientData(message) => PhaseError::InsufficientData(message),
            ScrapeError::Other(cause) => PhaseError::Internal(cause),
        }
    }
}

impl From<LlmError> for PhaseError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout(_) => PhaseError::LlmTimeout,
            other => PhaseError::Llm(other),
        }
    }
}

impl From<StoreError> for PhaseError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RunNotFound(run_id) => PhaseError::PrereqMissing(run_id),
            other => PhaseError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_are_paired() {
        let cases: Vec<(PhaseError, &str, u16)> = vec![
            (PhaseError::Validation("x".into()), "VALIDATION_ERROR", 400),
            (
                PhaseError::LowConfidence {
                    confidence: 0.5,
                    invalid: vec![],
                },
                "LOW_CONFIDENCE",
                422,
            ),
            (
                PhaseError::InsufficientData("x".into()),
                "INSUFFICIENT_DATA",
                424,
            ),
            (
                PhaseError::PrereqMissing("run_x".into()),
                "UPSTREAM_ARTIFACT_MISSING",
                424,
            ),
            (PhaseError::LlmTimeout, "OPENAI_TIMEOUT", 504),
            (
                PhaseError::Llm(LlmError::Auth),
                "OPENAI_ERROR",
                503,
            ),
            (
                PhaseError::Internal(anyhow::anyhow!("boom")),
                "INTERNAL_ERROR",
                500,
            ),
        ];
        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.http_status(), status);
        }
    }

    #[test]
    fn store_not_found_becomes_prereq_missing() {
        let err: PhaseError = StoreError::RunNotFound("run_abc".into()).into();
        assert_eq!(err.code(), "UPSTREAM_ARTIFACT_MISSING");
    }

    #[test]
    fn llm_timeout_maps_to_504_everything_else_503() {
        let timeout: PhaseError = LlmError::Timeout(std::time::Duration::from_secs(60)).into();
        assert_eq!(timeout.http_status(), 504);
        let rate: PhaseError = LlmError::RateLimited.into();
        assert_eq!(rate.http_status(), 503);
    }
}
