use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use brandscope_core::types::BrandAnalysis;

use crate::card::{brand_card, BrandCard};
use crate::deps::PhaseDeps;
use crate::error::{PhaseError, Result};
use crate::evidence::adjusted_confidence;
use crate::phases::{parse_artifact, PhaseMeta};
use crate::prompts;

/// A scrape that survives with fewer usable pages than this fails the phase.
const MIN_PAGES: usize = 3;
/// Adjusted confidence below this floor fails the phase.
const CONFIDENCE_FLOOR: f64 = 0.6;

#[derive(Debug, Serialize)]
pub struct BrandSummaryOutcome {
    pub run_id: String,
    pub brand: BrandAnalysis,
    pub brand_card: BrandCard,
    pub meta: PhaseMeta,
}

/// Create a run, scrape the brand site, analyze it, validate the citations,
/// gate on confidence, persist the artifact.
pub async fn run(deps: &PhaseDeps, brand_url: &str) -> Result<BrandSummaryOutcome> {
    let started = Instant::now();
    let started_at = Utc::now();

    let run = deps
        .runs
        .create(deps.run_lifetime, serde_json::json!({ "brand_url": brand_url }))
        .await?;
    info!(run_id = %run.run_id, brand_url, "Brand summary phase started");

    let scrape = deps.scraper.scrape(brand_url).await?;
    if scrape.pages.len() < MIN_PAGES {
        return Err(PhaseError::InsufficientData(format!(
            "only {} usable pages survived the scrape",
            scrape.pages.len()
        )));
    }
    // A cached result predates this request; a fresh one does not.
    let cached = scrape.meta.captured_at < started_at;

    let domain = scrape.meta.domain.clone();
    let raw = deps
        .llm
        .call_json("brand-analysis", &prompts::brand_analysis(&domain, &scrape.pages))
        .await?;
    let mut brand: BrandAnalysis = parse_artifact(raw)?;
    brand.domain = domain.clone();

    let validation = deps
        .validator
        .validate(&brand.evidence_refs, std::slice::from_ref(&domain))
        .await;
    brand.confidence = adjusted_confidence(brand.confidence, validation.confidence_penalty);
    let invalid = validation.invalid.clone();
    brand.evidence = Some(validation);

    if brand.confidence < CONFIDENCE_FLOOR {
        return Err(PhaseError::LowConfidence {
            confidence: brand.confidence,
            invalid,
        });
    }

    deps.runs.save_brand(&run.run_id, &brand).await?;
    info!(
        run_id = %run.run_id,
        domain,
        confidence = brand.confidence,
        "Brand summary phase complete"
    );

    let mut meta = PhaseMeta::finish(started);
    meta.pages_scraped = Some(scrape.meta.pages_after_dedup);
    meta.cached = Some(cached);

    Ok(BrandSummaryOutcome {
        run_id: run.run_id,
        brand_card: brand_card(&brand),
        brand,
        meta,
    })
}
