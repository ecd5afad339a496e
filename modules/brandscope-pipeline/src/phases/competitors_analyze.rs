use std::time::Instant;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::info;

use brandscope_core::types::CompetitorAnalysis;

use crate::deps::PhaseDeps;
use crate::error::{PhaseError, Result};
use crate::evidence::adjusted_confidence;
use crate::phases::{parse_artifact, PhaseMeta};
use crate::prompts;

#[derive(Debug, Serialize)]
pub struct CompetitorsAnalyzeOutcome {
    pub run_id: String,
    #[serde(rename = "competitorsAnalyzed")]
    pub competitors_analyzed: Vec<CompetitorAnalysis>,
    pub meta: PhaseMeta,
}

/// Deep-analyze the given competitor domains in parallel. Unlike page
/// fetching, one failing competitor fails the whole phase; the caller can
/// re-submit a smaller set.
pub async fn run(
    deps: &PhaseDeps,
    run_id: &str,
    domains: &[String],
) -> Result<CompetitorsAnalyzeOutcome> {
    let started = Instant::now();

    let run = deps.runs.get(run_id).await?;
    if run
        .competitors_ten
        .as_ref()
        .map_or(true, |candidates| candidates.is_empty())
    {
        return Err(PhaseError::PrereqMissing(format!(
            "run {run_id} has no discovered competitors yet"
        )));
    }

    let analyses =
        try_join_all(domains.iter().map(|domain| analyze_one(deps, domain))).await?;

    deps.runs.save_analyzed(run_id, &analyses).await?;
    info!(run_id, analyzed = analyses.len(), "Competitor analysis complete");

    Ok(CompetitorsAnalyzeOutcome {
        run_id: run_id.to_string(),
        competitors_analyzed: analyses,
        meta: PhaseMeta::finish(started),
    })
}

async fn analyze_one(deps: &PhaseDeps, domain: &str) -> Result<CompetitorAnalysis> {
    let scrape = deps.scraper.scrape(&format!("https://{domain}")).await?;

    let raw = deps
        .llm
        .call_json(
            "competitor-analysis",
            &prompts::competitor_analysis(domain, &scrape.pages),
        )
        .await?;
    let mut analysis: CompetitorAnalysis = parse_artifact(raw)?;
    analysis.profile.domain = domain.to_string();

    let validation = deps
        .validator
        .validate(&analysis.profile.evidence_refs, &[domain.to_string()])
        .await;
    analysis.profile.confidence =
        adjusted_confidence(analysis.profile.confidence, validation.confidence_penalty);
    analysis.profile.evidence = Some(validation);

    Ok(analysis)
}
