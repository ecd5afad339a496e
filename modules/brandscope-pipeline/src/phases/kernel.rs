use std::time::Instant;

use serde::Serialize;
use tracing::info;

use brandscope_core::types::Kernel;

use crate::deps::PhaseDeps;
use crate::error::{PhaseError, Result};
use crate::phases::{parse_artifact, PhaseMeta};
use crate::prompts;

#[derive(Debug, Serialize)]
pub struct KernelOutcome {
    pub run_id: String,
    pub kernel: Kernel,
    pub meta: PhaseMeta,
}

/// Synthesize the final kernel from the brand analysis and the analyzed
/// competitors. Both upstream slots are required.
pub async fn run(deps: &PhaseDeps, run_id: &str) -> Result<KernelOutcome> {
    let started = Instant::now();

    let run = deps.runs.get(run_id).await?;
    let brand = run.brand.ok_or_else(|| {
        PhaseError::PrereqMissing(format!("run {run_id} has no brand analysis yet"))
    })?;
    let analyzed = run
        .competitors_analyzed
        .filter(|analyses| !analyses.is_empty())
        .ok_or_else(|| {
            PhaseError::PrereqMissing(format!("run {run_id} has no analyzed competitors yet"))
        })?;

    let raw = deps
        .llm
        .call_json("kernel-assembly", &prompts::kernel_assembly(&brand, &analyzed))
        .await?;
    let kernel: Kernel = parse_artifact(raw)?;

    deps.runs.save_kernel(run_id, &kernel).await?;
    info!(run_id, "Kernel synthesis complete");

    Ok(KernelOutcome {
        run_id: run_id.to_string(),
        kernel,
        meta: PhaseMeta::finish(started),
    })
}
