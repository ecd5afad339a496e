use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scraped page. Never addressable on its own; always part of a
/// `ScrapeResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub text: String,
    pub captured_at: DateTime<Utc>,
}

/// Pipeline bookkeeping for a scrape, persisted alongside the pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeMeta {
    pub input_url: String,
    pub domain: String,
    pub candidates_discovered: usize,
    pub candidates_alive: usize,
    pub pages_scraped: usize,
    pub pages_after_dedup: usize,
    pub duration_ms: u64,
    pub captured_at: DateTime<Utc>,
}

/// Everything scraped from one brand site, keyed in the cache by the
/// canonical URL's hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub pages: Vec<Page>,
    pub meta: ScrapeMeta,
}

/// A citation the validator rejected, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidEvidence {
    pub url: String,
    pub reason: String,
}

/// Outcome of checking every cited URL for reachability and domain fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceValidation {
    pub valid: Vec<String>,
    pub invalid: Vec<InvalidEvidence>,
    pub confidence_penalty: f64,
}

/// LLM-produced analysis of one brand site.
///
/// `confidence` is the surfaced value: the model's self-reported confidence
/// minus the evidence penalty, floored at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandAnalysis {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub value_props: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub positioning: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
    #[serde(rename = "confidence_0_1", default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceValidation>,
}

/// A competitor surfaced by discovery. Only candidates at or above the 0.6
/// confidence floor are retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorCandidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
}

/// Deep analysis of one competitor: a brand profile plus competitive fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    #[serde(flatten)]
    pub profile: BrandAnalysis,
    #[serde(rename = "pricingApproach", default)]
    pub pricing_approach: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub differentiation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeywordMap {
    #[serde(default)]
    pub brand_unique: Vec<String>,
    #[serde(default)]
    pub shared: Vec<String>,
    #[serde(default)]
    pub white_space: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Low,
    Medium,
    High,
}

impl Default for Coverage {
    fn default() -> Self {
        Coverage::Low
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapEntry {
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub brand_coverage: Coverage,
    #[serde(default)]
    pub competitor_coverage: Coverage,
    #[serde(default)]
    pub opportunity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KernelInsights {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// The final synthesized competitive-intelligence document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kernel {
    #[serde(rename = "keywordMap", default)]
    pub keyword_map: KeywordMap,
    #[serde(rename = "gapMap", default)]
    pub gap_map: Vec<GapEntry>,
    #[serde(default)]
    pub insights: KernelInsights,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Active,
    Archived,
    Deleted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Active => "active",
            RunStatus::Archived => "archived",
            RunStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(RunStatus::Active),
            "archived" => Some(RunStatus::Archived),
            "deleted" => Some(RunStatus::Deleted),
            _ => None,
        }
    }
}

/// A keyed workspace accumulating one brand's pipeline artifacts.
///
/// Each slot is written once per phase; a rewrite replaces the slot
/// atomically. Expired runs are invisible to readers until reaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub brand: Option<BrandAnalysis>,
    #[serde(rename = "competitorsTen")]
    pub competitors_ten: Option<Vec<CompetitorCandidate>>,
    #[serde(rename = "competitorsAnalyzed")]
    pub competitors_analyzed: Option<Vec<CompetitorAnalysis>>,
    pub kernel: Option<Kernel>,
    pub status: RunStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Which cache layer answered (or failed to answer) a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Fast,
    Durable,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Fast => "fast",
            CacheTier::Durable => "durable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_round_trips_through_text() {
        for status in [RunStatus::Active, RunStatus::Archived, RunStatus::Deleted] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("paused"), None);
    }

    #[test]
    fn brand_analysis_tolerates_sparse_llm_output() {
        let sparse: BrandAnalysis = serde_json::from_value(serde_json::json!({
            "name": "Acme",
            "confidence_0_1": 0.82
        }))
        .expect("sparse object should deserialize");
        assert_eq!(sparse.name, "Acme");
        assert!((sparse.confidence - 0.82).abs() < f64::EPSILON);
        assert!(sparse.value_props.is_empty());
        assert!(sparse.evidence.is_none());
    }

    #[test]
    fn competitor_analysis_flattens_profile_fields() {
        let analysis: CompetitorAnalysis = serde_json::from_value(serde_json::json!({
            "name": "Rival",
            "domain": "rival.com",
            "confidence_0_1": 0.7,
            "pricingApproach": "freemium",
            "strengths": ["distribution"],
            "weaknesses": [],
            "differentiation": "wider catalog"
        }))
        .expect("flattened object should deserialize");
        assert_eq!(analysis.profile.name, "Rival");
        assert_eq!(analysis.pricing_approach, "freemium");

        let round = serde_json::to_value(&analysis).expect("serialize");
        assert_eq!(round["name"], "Rival");
        assert_eq!(round["pricingApproach"], "freemium");
    }

    #[test]
    fn kernel_coverage_uses_lowercase_wire_values() {
        let kernel: Kernel = serde_json::from_value(serde_json::json!({
            "keywordMap": {"brand_unique": ["wool"], "shared": [], "white_space": []},
            "gapMap": [{"area": "retail", "brand_coverage": "high", "competitor_coverage": "low", "opportunity": "own it"}],
            "insights": {"strengths": [], "opportunities": [], "risks": []},
            "recommendations": ["double down"]
        }))
        .expect("kernel should deserialize");
        assert_eq!(kernel.gap_map[0].brand_coverage, Coverage::High);
        assert_eq!(kernel.gap_map[0].competitor_coverage, Coverage::Low);
    }
}
