//! Authentication, rate limiting and request logging middleware.

use super::AppState;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use sha2::{Digest, Sha256};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, error, warn};

/// Global rate limiter (not keyed by IP).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Admin API quota, shared by every admin route.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Quota of `requests_per_minute`; zero is treated as one.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            global: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(1000)
    }
}

/// Reject admin requests once the quota is spent.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if rate_limit.global.check().is_err() {
        warn!("Admin rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Require `Authorization: Bearer <admin token>` on admin routes.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!("Admin API request rejected: no admin token configured");
        return Err(AppError::Forbidden);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if !secrets_match(expected, provided) {
        warn!(uri = %request.uri(), "Admin API request rejected: bad credentials");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Log each request with its status and latency.
///
/// Server errors log at error level, rejections at warn, the rest at debug.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        error!(%method, %path, %status, ?elapsed, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, %status, ?elapsed, "Request rejected");
    } else {
        debug!(%method, %path, %status, ?elapsed, "Request completed");
    }

    response
}

/// Hash a secret using SHA-256.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a configured secret with a provided one by their hashes.
pub fn secrets_match(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(provided) => hash_secret(provided) == hash_secret(expected),
        None => false,
    }
}
