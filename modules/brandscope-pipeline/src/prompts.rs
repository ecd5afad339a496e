//! Prompt builders for the four LLM endpoints. Every prompt spells out the
//! exact JSON keys the caller deserializes, because the provider is pinned
//! to JSON-object responses, not a schema.

use brandscope_core::helpers::truncate_to_char_boundary;
use brandscope_core::types::{BrandAnalysis, CompetitorAnalysis, Page};

/// Per-page text budget inside a prompt.
const MAX_PAGE_CHARS: usize = 6_000;
/// At most this many pages are quoted per site.
const MAX_PAGES_IN_PROMPT: usize = 12;

fn corpus(pages: &[Page]) -> String {
    let mut out = String::new();
    for page in pages.iter().take(MAX_PAGES_IN_PROMPT) {
        out.push_str(&format!(
            "--- {} ({})\n{}\n\n",
            page.url,
            page.title,
            truncate_to_char_boundary(&page.text, MAX_PAGE_CHARS)
        ));
    }
    out
}

pub fn brand_analysis(domain: &str, pages: &[Page]) -> String {
    format!(
        "Analyze the brand behind {domain} from the scraped pages below.\n\
         Return a JSON object with exactly these keys:\n\
         \"name\" (string), \"domain\" (string), \"tagline\" (string),\n\
         \"category\" (string), \"value_props\" (array of strings),\n\
         \"target_audience\" (string), \"positioning\" (string),\n\
         \"key_features\" (array of strings), \"summary\" (string, under 80 words),\n\
         \"evidence_refs\" (5 to 15 URLs taken verbatim from the pages below),\n\
         \"confidence_0_1\" (number between 0 and 1).\n\
         Only cite URLs that appear in the scraped pages.\n\n\
         Scraped pages:\n\n{corpus}",
        domain = domain,
        corpus = corpus(pages),
    )
}

pub fn competitors_discovery(brand: &BrandAnalysis) -> String {
    format!(
        "Identify the 10 most direct competitors of the brand profiled below.\n\
         Return a JSON object with one key \"competitors\": an array of 10\n\
         objects, each with \"name\" (string), \"domain\" (bare domain, no\n\
         scheme), \"confidence\" (number between 0 and 1) and \"rationale\"\n\
         (one sentence).\n\n\
         Brand profile:\n{profile}",
        profile = serde_json::to_string_pretty(brand).unwrap_or_default(),
    )
}

pub fn competitor_analysis(domain: &str, pages: &[Page]) -> String {
    format!(
        "Analyze the competitor behind {domain} from the scraped pages below.\n\
         Return a JSON object with exactly these keys:\n\
         \"name\", \"domain\", \"tagline\", \"category\" (strings),\n\
         \"value_props\" (array of strings), \"target_audience\" (string),\n\
         \"positioning\" (string), \"key_features\" (array of strings),\n\
         \"summary\" (string, under 80 words), \"evidence_refs\" (5 to 15 URLs\n\
         taken verbatim from the pages below), \"confidence_0_1\" (number\n\
         between 0 and 1), \"pricingApproach\" (string), \"strengths\" (array\n\
         of strings), \"weaknesses\" (array of strings), \"differentiation\"\n\
         (string).\n\
         Only cite URLs that appear in the scraped pages.\n\n\
         Scraped pages:\n\n{corpus}",
        domain = domain,
        corpus = corpus(pages),
    )
}

pub fn kernel_assembly(brand: &BrandAnalysis, analyzed: &[CompetitorAnalysis]) -> String {
    format!(
        "Synthesize a competitive-intelligence kernel for the brand below\n\
         against its analyzed competitors.\n\
         Return a JSON object with exactly these keys:\n\
         \"keywordMap\": {{\"brand_unique\": [...], \"shared\": [...],\n\
         \"white_space\": [...]}} (arrays of keyword strings),\n\
         \"gapMap\": array of {{\"area\", \"brand_coverage\",\n\
         \"competitor_coverage\", \"opportunity\"}} where the coverage values\n\
         are \"low\", \"medium\" or \"high\",\n\
         \"insights\": {{\"strengths\": [...], \"opportunities\": [...],\n\
         \"risks\": [...]}},\n\
         \"recommendations\": array of strings.\n\n\
         Brand:\n{brand_json}\n\nCompetitors:\n{competitors_json}",
        brand_json = serde_json::to_string_pretty(brand).unwrap_or_default(),
        competitors_json = serde_json::to_string_pretty(analyzed).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(url: &str, text: &str) -> Page {
        Page {
            url: url.to_string(),
            title: "t".to_string(),
            text: text.to_string(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn corpus_caps_page_count_and_length() {
        let long = "word ".repeat(5_000);
        let pages: Vec<Page> = (0..20)
            .map(|i| page(&format!("https://a.com/{i}"), &long))
            .collect();
        let body = corpus(&pages);
        assert!(body.matches("--- https://a.com/").count() <= MAX_PAGES_IN_PROMPT);
        assert!(!body.contains(&format!("https://a.com/{}", MAX_PAGES_IN_PROMPT)));
    }

    #[test]
    fn brand_prompt_names_every_expected_key() {
        let prompt = brand_analysis("allbirds.com", &[page("https://allbirds.com/", "wool")]);
        for key in [
            "name",
            "tagline",
            "value_props",
            "evidence_refs",
            "confidence_0_1",
        ] {
            assert!(prompt.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn kernel_prompt_uses_camel_case_map_keys() {
        let brand: BrandAnalysis = serde_json::from_value(serde_json::json!({"name": "A"}))
            .expect("brand");
        let prompt = kernel_assembly(&brand, &[]);
        assert!(prompt.contains("keywordMap"));
        assert!(prompt.contains("gapMap"));
    }
}
