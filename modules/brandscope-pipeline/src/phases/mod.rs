//! The four phase orchestrators. Each loads its prerequisites, does its
//! work, saves its artifact slot, and only then returns. A later phase
//! observes an earlier phase's artifact exactly when that phase succeeded.

pub mod brand_summary;
pub mod competitors;
pub mod competitors_analyze;
pub mod kernel;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use llm_client::LlmError;

use crate::error::{PhaseError, Result};

/// Response metadata common to every phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseMeta {
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_scraped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl PhaseMeta {
    fn finish(started: std::time::Instant) -> Self {
        Self {
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
            pages_scraped: None,
            cached: None,
        }
    }
}

/// Deserialize an LLM JSON object into a typed artifact. A shape mismatch is
/// a provider protocol failure, not an internal error.
pub(crate) fn parse_artifact<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| PhaseError::Llm(LlmError::Protocol(e.to_string())))
}
