use serde::{Deserialize, Serialize};

use brandscope_core::types::BrandAnalysis;

/// Stable presentation projection of a brand analysis. Purely deterministic:
/// the same analysis always yields the same card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandCard {
    pub title: String,
    pub tagline: String,
    pub domain: String,
    pub category: String,
    #[serde(rename = "confidence_0_1")]
    pub confidence: f64,
    pub sections: Vec<CardSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSection {
    pub heading: String,
    pub items: Vec<String>,
}

pub fn brand_card(brand: &BrandAnalysis) -> BrandCard {
    BrandCard {
        title: brand.name.clone(),
        tagline: brand.tagline.clone(),
        domain: brand.domain.clone(),
        category: brand.category.clone(),
        confidence: brand.confidence,
        sections: vec![
            CardSection {
                heading: "Value propositions".to_string(),
                items: brand.value_props.clone(),
            },
            CardSection {
                heading: "Audience & positioning".to_string(),
                items: vec![brand.target_audience.clone(), brand.positioning.clone()],
            },
            CardSection {
                heading: "Key features".to_string(),
                items: brand.key_features.clone(),
            },
            CardSection {
                heading: "Evidence".to_string(),
                items: brand.evidence_refs.clone(),
            },
        ],
    }
}
