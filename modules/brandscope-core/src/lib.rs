pub mod config;
pub mod helpers;
pub mod metrics;
pub mod types;

pub use config::Config;
pub use helpers::{domain_of, jaccard_similarity, token_set, truncate_to_char_boundary, url_hash};
pub use metrics::AppMetrics;
pub use types::{
    BrandAnalysis, CacheTier, CompetitorAnalysis, CompetitorCandidate, Coverage,
    EvidenceValidation, GapEntry, InvalidEvidence, Kernel, KernelInsights, KeywordMap, Page, Run,
    RunStatus, ScrapeMeta, ScrapeResult,
};
