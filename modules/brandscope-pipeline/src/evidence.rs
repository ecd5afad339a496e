use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use brandscope_core::helpers::domain_of;
use brandscope_core::types::{EvidenceValidation, InvalidEvidence};

/// Per-citation HEAD timeout.
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);
/// Penalty ceiling, reached when every citation is invalid.
const MAX_PENALTY: f64 = 0.3;

/// Checks cited URLs for reachability and allow-listed domains, and computes
/// the bounded confidence penalty.
#[derive(Clone)]
pub struct EvidenceValidator {
    http: reqwest::Client,
}

impl EvidenceValidator {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Check every citation in parallel against the allow-list.
    pub async fn validate(&self, urls: &[String], allow: &[String]) -> EvidenceValidation {
        let checks = urls.iter().map(|url| self.check(url, allow));
        let outcomes = join_all(checks).await;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(()) => valid.push(url.clone()),
                Err(reason) => {
                    debug!(url, reason, "Citation rejected");
                    invalid.push(InvalidEvidence {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }

        let confidence_penalty = penalty(invalid.len(), urls.len());
        EvidenceValidation {
            valid,
            invalid,
            confidence_penalty,
        }
    }

    async fn check(&self, url: &str, allow: &[String]) -> std::result::Result<(), String> {
        let host = domain_of(url).ok_or_else(|| "unparseable URL".to_string())?;
        if !allow.iter().any(|allowed| *allowed == host) {
            return Err("domain not allowed".to_string());
        }

        let response = self
            .http
            .head(url)
            .timeout(HEAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        // Redirects are followed; judge the domain of where we ended up.
        let final_host = domain_of(response.url().as_str()).unwrap_or_default();
        if !allow.iter().any(|allowed| *allowed == final_host) {
            return Err("redirected off-domain".to_string());
        }

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        Ok(())
    }
}

/// `min(invalid/total × 0.3, 0.3)`; zero when there are no citations.
pub fn penalty(invalid: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((invalid as f64 / total as f64) * MAX_PENALTY).min(MAX_PENALTY)
}

/// Surfaced confidence: the reported value less the penalty, floored at zero.
pub fn adjusted_confidence(reported: f64, penalty: f64) -> f64 {
    (reported - penalty).max(0.0)
}
