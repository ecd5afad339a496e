use std::sync::Arc;

use brandscope_core::AppMetrics;
use brandscope_scraper::Scraper;
use brandscope_store::RunStore;
use llm_client::LlmClient;

use crate::evidence::EvidenceValidator;

/// Shared dependency container for the four phase handlers. Holds long-lived,
/// cloneable resources; phases construct nothing global themselves.
#[derive(Clone)]
pub struct PhaseDeps {
    pub runs: RunStore,
    pub scraper: Arc<Scraper>,
    pub llm: Arc<LlmClient>,
    pub validator: EvidenceValidator,
    pub metrics: Arc<AppMetrics>,
    /// Lifetime granted to new runs.
    pub run_lifetime: chrono::Duration,
}
