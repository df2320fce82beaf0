use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use oncoderma_core::AppError;
use oncoderma_infra::cache::{cache_key, CachedResponse, ResponseCache};

use crate::error::HttpAppError;

const CACHE_STATUS_HEADER: &str = "X-Cache";

fn replay(cached: CachedResponse) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    if let Some(content_type) = cached
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("HIT"));
    response
}

/// Serve anonymous GETs from the cache; store 2xx bodies within the size ceiling.
pub async fn response_cache_middleware(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || request.headers().contains_key(header::AUTHORIZATION) {
        return next.run(request).await;
    }

    let key = cache_key(request.method(), request.uri());
    if let Some(cached) = cache.get(&key).await {
        tracing::debug!(key = %key, "Cache hit");
        return replay(cached);
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));

    if !response.status().is_success() {
        return response;
    }

    let fits = response
        .body()
        .size_hint()
        .exact()
        .is_some_and(|len| len <= cache.max_body_bytes() as u64);
    if !fits {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, cache.max_body_bytes()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpAppError(AppError::Internal(format!(
                "Failed to buffer response for caching: {}",
                e
            )))
            .into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: bytes.clone(),
    };
    cache.put_default(key, cached).await;

    Response::from_parts(parts, Body::from(bytes))
}
