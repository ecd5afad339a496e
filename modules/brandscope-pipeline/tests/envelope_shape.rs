//! The response envelopes are part of the wire contract: `run_id`, the
//! phase body, and `meta` at the top level.

use chrono::Utc;

use brandscope_core::types::BrandAnalysis;
use brandscope_pipeline::{brand_card, BrandSummaryOutcome, KernelOutcome, PhaseMeta};

fn meta() -> PhaseMeta {
    PhaseMeta {
        duration_ms: 1234,
        timestamp: Utc::now(),
        pages_scraped: Some(9),
        cached: Some(false),
    }
}

fn brand() -> BrandAnalysis {
    serde_json::from_value(serde_json::json!({
        "name": "Allbirds",
        "domain": "allbirds.com",
        "tagline": "Light on your feet",
        "category": "footwear",
        "value_props": ["comfort"],
        "target_audience": "commuters",
        "positioning": "premium eco",
        "key_features": ["wool"],
        "summary": "Shoes.",
        "evidence_refs": ["https://allbirds.com/about"],
        "confidence_0_1": 0.82
    }))
    .expect("brand fixture")
}

#[test]
fn brand_summary_envelope_has_run_id_body_and_meta() {
    let analysis = brand();
    let outcome = BrandSummaryOutcome {
        run_id: "run_6fa459ea-ee8a-3ca4-894e-db77e160355e".to_string(),
        brand_card: brand_card(&analysis),
        brand: analysis,
        meta: meta(),
    };

    let value = serde_json::to_value(&outcome).expect("serialize");
    assert!(value["run_id"].as_str().expect("run_id").starts_with("run_"));
    assert_eq!(value["brand"]["domain"], "allbirds.com");
    assert_eq!(value["brand"]["confidence_0_1"], 0.82);
    assert_eq!(value["brand_card"]["title"], "Allbirds");
    assert_eq!(value["meta"]["pages_scraped"], 9);
    assert_eq!(value["meta"]["cached"], false);
    assert!(value["meta"]["duration_ms"].is_u64());
}

#[test]
fn kernel_envelope_uses_camel_case_map_keys() {
    let kernel = serde_json::from_value(serde_json::json!({
        "keywordMap": {"brand_unique": ["wool"], "shared": ["shoes"], "white_space": []},
        "gapMap": [{
            "area": "retail",
            "brand_coverage": "high",
            "competitor_coverage": "medium",
            "opportunity": "own it"
        }],
        "insights": {"strengths": ["s"], "opportunities": ["o"], "risks": ["r"]},
        "recommendations": ["do the thing"]
    }))
    .expect("kernel fixture");

    let outcome = KernelOutcome {
        run_id: "run_abc123".to_string(),
        kernel,
        meta: meta(),
    };

    let value = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(value["kernel"]["keywordMap"]["brand_unique"][0], "wool");
    assert_eq!(value["kernel"]["gapMap"][0]["brand_coverage"], "high");
    assert_eq!(value["kernel"]["insights"]["risks"][0], "r");
}
