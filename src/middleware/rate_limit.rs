use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::ratelimit::Decision;
use crate::state::AppState;

/// Throttle by caller identity. Applied to the unauthenticated intake route;
/// authenticated admin traffic is not throttled.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&headers, request.extensions().get::<ConnectInfo<SocketAddr>>());

    match state.limiter.allow(&key) {
        Decision::Allowed => Ok(next.run(request).await),
        Decision::Denied { retry_after_secs } => {
            tracing::warn!(client = %key, "rate limit exceeded");
            Err(ApiError::RateLimitExceeded { retry_after_secs })
        }
    }
}

/// Caller identity: first hop of `X-Forwarded-For` when present (we sit
/// behind a proxy in deployment), else the peer address, else a shared
/// bucket.
fn client_key(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    match peer {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}
