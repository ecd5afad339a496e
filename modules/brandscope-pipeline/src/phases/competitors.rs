use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use brandscope_core::types::CompetitorCandidate;

use crate::deps::PhaseDeps;
use crate::error::{PhaseError, Result};
use crate::phases::{parse_artifact, PhaseMeta};
use crate::prompts;

/// Discovered candidates below this confidence are discarded.
const CANDIDATE_FLOOR: f64 = 0.6;

#[derive(Debug, Serialize)]
pub struct CompetitorsOutcome {
    pub run_id: String,
    pub competitors: Vec<CompetitorCandidate>,
    pub meta: PhaseMeta,
}

#[derive(Debug, Deserialize)]
struct Discovery {
    #[serde(default)]
    competitors: Vec<CompetitorCandidate>,
}

/// Discover competitor candidates for a run whose brand phase completed.
pub async fn run(deps: &PhaseDeps, run_id: &str) -> Result<CompetitorsOutcome> {
    let started = Instant::now();

    let run = deps.runs.get(run_id).await?;
    let brand = run.brand.ok_or_else(|| {
        PhaseError::PrereqMissing(format!("run {run_id} has no brand analysis yet"))
    })?;

    let raw = deps
        .llm
        .call_json("competitors-discovery", &prompts::competitors_discovery(&brand))
        .await?;
    let discovery: Discovery = parse_artifact(raw)?;

    let before = discovery.competitors.len();
    let competitors: Vec<CompetitorCandidate> = discovery
        .competitors
        .into_iter()
        .filter(|candidate| candidate.confidence >= CANDIDATE_FLOOR)
        .collect();
    info!(
        run_id,
        discovered = before,
        retained = competitors.len(),
        "Competitor discovery complete"
    );

    deps.runs.save_competitors(run_id, &competitors).await?;

    Ok(CompetitorsOutcome {
        run_id: run_id.to_string(),
        competitors,
        meta: PhaseMeta::finish(started),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_filter_keeps_floor_and_above() {
        let discovery: Discovery = serde_json::from_value(serde_json::json!({
            "competitors": [
                {"name": "A", "domain": "a.com", "confidence": 0.9, "rationale": "x"},
                {"name": "B", "domain": "b.com", "confidence": 0.6, "rationale": "x"},
                {"name": "C", "domain": "c.com", "confidence": 0.59, "rationale": "x"}
            ]
        }))
        .expect("discovery");
        let kept: Vec<_> = discovery
            .competitors
            .into_iter()
            .filter(|c| c.confidence >= CANDIDATE_FLOOR)
            .collect();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|c| c.domain != "c.com"));
    }

    #[test]
    fn discovery_tolerates_missing_competitors_key() {
        let discovery: Discovery =
            serde_json::from_value(serde_json::json!({})).expect("empty object");
        assert!(discovery.competitors.is_empty());
    }
}
