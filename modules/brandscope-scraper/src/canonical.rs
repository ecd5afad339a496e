use url::Url;

use crate::error::ScrapeError;

/// Canonicalize a brand URL: http/https only, fragment stripped.
/// Idempotent: canonicalizing a canonical URL is a no-op.
pub fn canonicalize(input: &str) -> Result<Url, ScrapeError> {
    let mut url = Url::parse(input.trim())
        .map_err(|_| ScrapeError::Validation(format!("not a valid URL: {input}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScrapeError::Validation(format!(
                "unsupported scheme: {other}"
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(ScrapeError::Validation("URL has no host".to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_keeps_query() {
        let url = canonicalize("https://allbirds.com/about?ref=nav#team").expect("valid");
        assert_eq!(url.as_str(), "https://allbirds.com/about?ref=nav");
    }

    #[test]
    fn is_idempotent() {
        let once = canonicalize("HTTPS://Allbirds.com/#top").expect("valid");
        let twice = canonicalize(once.as_str()).expect("still valid");
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_non_http_schemes() {
        for input in ["ftp://example.com/", "file:///etc/passwd", "javascript:alert(1)"] {
            assert!(
                matches!(canonicalize(input), Err(ScrapeError::Validation(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["not-a-url", "", "http://"] {
            assert!(
                matches!(canonicalize(input), Err(ScrapeError::Validation(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
