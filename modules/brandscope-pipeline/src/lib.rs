//! Phase orchestration over the scraper, LLM client, evidence validator and
//! run store, plus the background maintenance loops.

mod card;
mod deps;
mod error;
mod evidence;
mod phases;
mod prompts;
mod reaper;

pub use card::{brand_card, BrandCard, CardSection};
pub use deps::PhaseDeps;
pub use error::{PhaseError, Result, EVIDENCE_VIOLATION};
pub use evidence::{adjusted_confidence, penalty, EvidenceValidator};
pub use phases::brand_summary::{self, BrandSummaryOutcome};
pub use phases::competitors::{self, CompetitorsOutcome};
pub use phases::competitors_analyze::{self, CompetitorsAnalyzeOutcome};
pub use phases::kernel::{self, KernelOutcome};
pub use phases::PhaseMeta;
pub use reaper::{spawn_reaper, spawn_run_gauge};
