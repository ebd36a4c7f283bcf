/// Rate limiting middleware
///
/// Applies the shared sliding-window limiter to every /api request, keyed
/// by client address. Deployments without Redis run with the disabled
/// limiter, which admits everything, so the layer is always mounted.
///
/// # Headers
///
/// Responses carry the usual limit headers when limiting is active:
/// - `X-RateLimit-Limit`: request budget per window
/// - `X-RateLimit-Remaining`: requests left in the current window
/// - `Retry-After`: seconds to wait (429 responses only)

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

/// Resolves the identifier a request is limited under
///
/// First address in X-Forwarded-For when present (the platform runs behind
/// a proxy), otherwise X-Real-IP, otherwise a shared bucket.
fn client_identifier(request: &Request) -> String {
    let headers = request.headers();

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    "anonymous".to_string()
}

/// Rate limiting middleware layer
///
/// Returns 429 with Retry-After when the window is exhausted. A limiter
/// backend failure admits the request: limiting protects capacity, it is
/// not load-bearing for correctness.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limiter = &state.services.rate_limiter;

    if !limiter.is_enabled() {
        return Ok(next.run(request).await);
    }

    let identifier = client_identifier(&request);

    let decision = match limiter.check(&identifier).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(%identifier, error = %e, "Rate limit check failed; admitting request");
            return Ok(next.run(request).await);
        }
    };

    if !decision.allowed {
        return Err(ApiError::RateLimitExceeded {
            retry_after: decision.reset_after_secs,
            message: format!(
                "Rate limit exceeded. Try again in {} seconds",
                decision.reset_after_secs
            ),
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }

    Ok(response)
}
