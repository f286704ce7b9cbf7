//! API middleware.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::metrics;

/// Per-IP rate limiter using governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Maximum number of IPs to track in the limiter cache.
/// Caps memory growth when clients arrive from many addresses.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

/// How long an idle per-IP limiter stays cached.
const LIMITER_TTL: Duration = Duration::from_secs(3600);

struct CachedLimiter {
    limiter: Arc<IpRateLimiter>,
    created_at: Instant,
}

/// IP-based rate limiter cache with automatic cleanup.
#[derive(Clone)]
pub struct RateLimiterCache {
    limiters: Arc<RwLock<HashMap<IpAddr, CachedLimiter>>>,
    quota: Quota,
}

impl RateLimiterCache {
    /// Create a cache handing out `requests_per_second` quotas.
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second)
            .unwrap_or_else(|| NonZeroU32::new(10).expect("nonzero fallback"));

        Self {
            limiters: Arc::new(RwLock::new(HashMap::new())),
            quota: Quota::per_second(per_second),
        }
    }

    /// Drop expired limiters, then the oldest entries if still over capacity.
    async fn cleanup_expired(&self) {
        let mut limiters = self.limiters.write().await;
        let now = Instant::now();

        limiters.retain(|_, cached| now.duration_since(cached.created_at) < LIMITER_TTL);

        let overflow = limiters.len().saturating_sub(MAX_RATE_LIMITER_ENTRIES);
        if overflow > 0 {
            let mut by_age: Vec<(IpAddr, Instant)> = limiters
                .iter()
                .map(|(ip, cached)| (*ip, cached.created_at))
                .collect();
            by_age.sort_by_key(|(_, created_at)| *created_at);

            for (ip, _) in by_age.into_iter().take(overflow) {
                limiters.remove(&ip);
            }
            warn!("Rate limiter cache exceeded capacity, removed {overflow} entries");
        }
    }

    /// Get or create the limiter for an IP.
    pub async fn get_limiter(&self, ip: IpAddr) -> Arc<IpRateLimiter> {
        if let Some(cached) = self.limiters.read().await.get(&ip) {
            return Arc::clone(&cached.limiter);
        }

        let mut limiters = self.limiters.write().await;
        // Another task may have inserted while we waited for the write lock
        if let Some(cached) = limiters.get(&ip) {
            return Arc::clone(&cached.limiter);
        }

        if limiters.len() >= MAX_RATE_LIMITER_ENTRIES {
            drop(limiters);
            self.cleanup_expired().await;
            limiters = self.limiters.write().await;
        }

        let limiter = Arc::new(RateLimiter::direct(self.quota));
        limiters.insert(
            ip,
            CachedLimiter {
                limiter: Arc::clone(&limiter),
                created_at: Instant::now(),
            },
        );
        limiter
    }

    /// True when the IP is still within its quota.
    pub async fn check(&self, ip: IpAddr) -> bool {
        self.get_limiter(ip).await.check().is_ok()
    }
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::{header, Method};

    let wildcard = origins.iter().any(|o| o == "*");
    if wildcard {
        // Wildcard origin cannot carry credentials
        return CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
            .allow_origin(Any)
            .max_age(Duration::from_secs(600));
    }

    // Explicit origins allow credentials, but tower-http panics when
    // credentials are combined with wildcard headers, so list them.
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ])
        // Content-Disposition carries the download filename
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
        ])
        .allow_credentials(true)
        .allow_origin(origins)
        .max_age(Duration::from_secs(600))
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(id.clone());
    Span::current().record("request_id", &id);

    let mut response = next.run(request).await;
    if let Ok(value) = id.parse() {
        response.headers_mut().insert("X-Request-ID", value);
    }
    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    // Health probes poll frequently and would drown out real traffic
    if uri.path() != "/health" {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %started.elapsed().as_millis(),
            "Request completed"
        );
    }

    response
}

/// Rate limiting middleware backed by the per-IP limiter cache.
pub async fn rate_limit_middleware(
    State(limiters): State<Arc<RateLimiterCache>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    // Requests with no resolvable client IP pass through unthrottled
    if let Some(ip) = extract_client_ip(&request) {
        if !limiters.check(ip).await {
            warn!(ip = %ip, "Rate limit exceeded");
            metrics::record_rate_limit_hit(request.uri().path());
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", "1")],
                "Rate limit exceeded, retry shortly",
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Client IP from proxy headers, falling back to the socket address.
fn extract_client_ip(request: &Request<Body>) -> Option<IpAddr> {
    let headers = request.headers();

    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        // The first hop in the chain is the original client
        .and_then(|chain| chain.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|connect| connect.0.ip())
        })
}
