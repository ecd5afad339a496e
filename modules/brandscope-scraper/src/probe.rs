use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

/// Per-URL HEAD timeout.
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

/// HEAD every candidate in parallel (bounded only by the candidate list) and
/// keep those answering 2xx after redirects.
pub async fn probe_candidates(http: &reqwest::Client, candidates: &[String]) -> Vec<String> {
    let probes = candidates.iter().map(|url| async move {
        match http.head(url).timeout(HEAD_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => Some(url.clone()),
            Ok(response) => {
                debug!(url, status = %response.status(), "Probe rejected");
                None
            }
            Err(e) => {
                debug!(url, error = %e, "Probe failed");
                None
            }
        }
    });

    join_all(probes).await.into_iter().flatten().collect()
}
