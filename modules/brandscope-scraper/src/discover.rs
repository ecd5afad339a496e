use std::collections::HashSet;

use url::Url;

/// Paths probed on every brand site, root first.
const COMMON_PATHS: &[&str] = &[
    "/",
    "/about",
    "/about-us",
    "/products",
    "/services",
    "/features",
    "/solutions",
    "/pricing",
    "/how-it-works",
    "/customers",
    "/case-studies",
    "/blog",
    "/news",
    "/company",
    "/team",
    "/careers",
    "/faq",
    "/contact",
    "/shop",
    "/sustainability",
];

/// Candidate URLs for a site: the canonical root joined with each common
/// path, deduplicated, input order preserved.
pub fn candidates(root: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for path in COMMON_PATHS {
        let Ok(candidate) = root.join(path) else {
            continue;
        };
        let candidate = candidate.to_string();
        if seen.insert(candidate.clone()) {
            urls.push(candidate);
        }
    }

    urls
}
