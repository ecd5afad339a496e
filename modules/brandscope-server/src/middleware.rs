use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;
use uuid::Uuid;

use brandscope_store::RequestRecord;

use crate::rest::ApiError;
use crate::state::AppState;

/// Correlation id for one request, stored as a request extension and echoed
/// on every response envelope and log line.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse the caller's `x-request-id` when it carries something usable;
    /// mint a fresh UUIDv4 otherwise.
    fn for_request(headers: &HeaderMap) -> Self {
        let inbound = headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty());
        match inbound {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

/// Pin a correlation id to the request and run everything below inside a
/// span carrying it, so each layer's logs line up with the response envelope.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let correlation = RequestId::for_request(req.headers());
    let span = tracing::info_span!("request", request_id = %correlation.0);

    let echo = HeaderValue::try_from(correlation.0.clone()).ok();
    req.extensions_mut().insert(correlation);

    let mut response = next.run(req).instrument(span).await;
    if let Some(value) = echo {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

fn correlation_id(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Reject requests whose `X-API-Key` header does not match the configured
/// secret. The presented key is never logged.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if presented != state.config.api_key {
        let correlation = correlation_id(&req);
        return ApiError::new(401, "UNAUTHORIZED", "missing or invalid API key", correlation)
            .into_response();
    }

    next.run(req).await
}

/// Sliding-window rate limiter keyed by (client IP, presented API key).
pub struct RateLimiter {
    max: u32,
    window: Duration,
    hits: Mutex<HashMap<(IpAddr, String), Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for the key at `now` and report whether it is allowed.
    pub fn check_at(&self, ip: IpAddr, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        let entry = hits.entry((ip, key.to_string())).or_default();
        entry.retain(|seen| now.duration_since(*seen) < self.window);
        if entry.len() >= self.max as usize {
            return false;
        }
        entry.push(now);
        true
    }

    pub fn check(&self, ip: IpAddr, key: &str) -> bool {
        self.check_at(ip, key, Instant::now())
    }
}

pub async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let key = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !state.rate_limiter.check(ip, &key) {
        let correlation = correlation_id(&req);
        return ApiError::new(
            429,
            "RATE_LIMIT_EXCEEDED",
            "too many requests for this client and key",
            correlation,
        )
        .into_response();
    }

    next.run(req).await
}

/// Record every request: counter series plus an audit row. The audit write
/// happens off the response path.
pub async fn record_request(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string());
    let request_id = correlation_id(&req);
    let started = Instant::now();

    let res = next.run(req).await;

    let status = res.status().as_u16();
    state.metrics.record_http(&path, status);

    let record = RequestRecord {
        request_id,
        method,
        path,
        status: status as i16,
        duration_ms: started.elapsed().as_millis() as i32,
        client_ip,
    };
    let log = state.request_log.clone();
    tokio::spawn(async move {
        log.record(record).await;
    });

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_reuses_inbound_header_or_mints() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc-123"));
        assert_eq!(RequestId::for_request(&headers).0, "abc-123");

        // No header, or a blank one, gets a fresh UUIDv4.
        assert_eq!(RequestId::for_request(&HeaderMap::new()).0.len(), 36);
        let mut blank = HeaderMap::new();
        blank.insert("x-request-id", HeaderValue::from_static("   "));
        assert_eq!(RequestId::for_request(&blank).0.len(), 36);
    }

    #[test]
    fn rate_limiter_allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(20, Duration::from_secs(60));
        let ip = IpAddr::from([127, 0, 0, 1]);
        let now = Instant::now();

        for i in 0..20 {
            assert!(limiter.check_at(ip, "key", now), "hit {i} should pass");
        }
        for _ in 0..5 {
            assert!(!limiter.check_at(ip, "key", now));
        }
    }

    #[test]
    fn rate_limiter_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let ip = IpAddr::from([10, 0, 0, 1]);
        let start = Instant::now();

        assert!(limiter.check_at(ip, "k", start));
        assert!(limiter.check_at(ip, "k", start));
        assert!(!limiter.check_at(ip, "k", start));

        // Past the window the budget refills.
        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at(ip, "k", later));
    }

    #[test]
    fn rate_limiter_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let ip_a = IpAddr::from([10, 0, 0, 1]);
        let ip_b = IpAddr::from([10, 0, 0, 2]);
        let now = Instant::now();

        assert!(limiter.check_at(ip_a, "k1", now));
        assert!(!limiter.check_at(ip_a, "k1", now));
        // Different key, same IP.
        assert!(limiter.check_at(ip_a, "k2", now));
        // Different IP, same key.
        assert!(limiter.check_at(ip_b, "k1", now));
    }
}
