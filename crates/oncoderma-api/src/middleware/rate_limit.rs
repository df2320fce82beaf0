use axum::http::HeaderValue;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use oncoderma_core::AppError;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::ip_extraction::client_identifier;

fn set_limit_headers(response: &mut Response, limit: u32, remaining: u32) {
    if let Ok(header_value) = HeaderValue::from_str(&limit.to_string()) {
        response
            .headers_mut()
            .insert("X-RateLimit-Limit", header_value);
    }
    if let Ok(header_value) = HeaderValue::from_str(&remaining.to_string()) {
        response
            .headers_mut()
            .insert("X-RateLimit-Remaining", header_value);
    }
}

/// Per-client sliding-window admission. Denied calls never reach the router.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identifier(&request, state.config.trust_forwarded_headers);
    let limit = state.rate_limiter.limit();

    match state.rate_limiter.check(&client).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            set_limit_headers(&mut response, limit, remaining);
            response
        }
        Err(retry_after) => {
            let mut response = HttpAppError(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            })
            .into_response();
            set_limit_headers(&mut response, limit, 0);
            response
        }
    }
}
