use std::collections::HashSet;

use brandscope_core::helpers::{jaccard_similarity, token_set};
use brandscope_core::types::Page;

/// Pages more similar than this to an already-kept page are dropped.
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Greedy near-duplicate collapse. The first page always survives; each
/// later page is dropped if its token-set Jaccard similarity to any kept
/// page exceeds the threshold.
pub fn dedupe_pages(pages: Vec<Page>) -> Vec<Page> {
    let mut kept: Vec<(Page, HashSet<String>)> = Vec::with_capacity(pages.len());

    for page in pages {
        let tokens = token_set(&page.text);
        let duplicate = kept
            .iter()
            .any(|(_, existing)| jaccard_similarity(&tokens, existing) > SIMILARITY_THRESHOLD);
        if !duplicate {
            kept.push((page, tokens));
        }
    }

    kept.into_iter().map(|(page, _)| page).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(url: &str, text: &str) -> Page {
        Page {
            url: url.to_string(),
            title: String::new(),
            text: text.to_string(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn identical_bodies_collapse_to_first() {
        let pages = vec![
            page("https://a.com/", "sustainable wool shoes made simple"),
            page("https://a.com/home", "sustainable wool shoes made simple"),
        ];
        let deduped = dedupe_pages(pages);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].url, "https://a.com/");
    }

    #[test]
    fn distinct_bodies_all_survive() {
        let pages = vec![
            page("https://a.com/", "sustainable wool shoes"),
            page("https://a.com/pricing", "pricing plans start at ten dollars monthly"),
            page("https://a.com/team", "our founders met while hiking patagonia"),
        ];
        assert_eq!(dedupe_pages(pages).len(), 3);
    }

    #[test]
    fn similarity_exactly_at_threshold_survives() {
        // 4 shared tokens of 5 union → 0.8, which is not above the threshold.
        let pages = vec![
            page("https://a.com/", "alpha beta gamma delta"),
            page("https://a.com/b", "alpha beta gamma delta epsilon"),
        ];
        assert_eq!(dedupe_pages(pages).len(), 2);
    }

    #[test]
    fn every_surviving_pair_is_within_threshold() {
        let pages = vec![
            page("https://a.com/1", "one two three four five"),
            page("https://a.com/2", "one two three four five six"),
            page("https://a.com/3", "totally different content here"),
            page("https://a.com/4", "one two three four five seven"),
        ];
        let deduped = dedupe_pages(pages);
        for i in 0..deduped.len() {
            for j in (i + 1)..deduped.len() {
                let a = token_set(&deduped[i].text);
                let b = token_set(&deduped[j].text);
                assert!(
                    jaccard_similarity(&a, &b) <= SIMILARITY_THRESHOLD,
                    "{} and {} too similar",
                    deduped[i].url,
                    deduped[j].url
                );
            }
        }
    }
}
