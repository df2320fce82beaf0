use axum::http::HeaderValue;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use oncoderma_core::constants::SLOW_REQUEST_THRESHOLD_SECS;
use oncoderma_infra::get_request_id;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests: AtomicU64,
    failed: AtomicU64,
    slow: AtomicU64,
}

impl RequestMetrics {
    pub fn requests_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn slow_count(&self) -> u64 {
        self.slow.load(Ordering::Relaxed)
    }
}

/// Count the request, time it and stamp `X-Process-Time` (seconds).
pub async fn request_metrics_middleware(
    State(metrics): State<Arc<RequestMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = get_request_id(&request).unwrap_or_default();
    metrics.requests.fetch_add(1, Ordering::Relaxed);

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", elapsed)) {
        response.headers_mut().insert("X-Process-Time", value);
    }

    let status = response.status();
    let slow = elapsed > SLOW_REQUEST_THRESHOLD_SECS;
    if status.as_u16() >= 400 {
        metrics.failed.fetch_add(1, Ordering::Relaxed);
    }
    if slow {
        metrics.slow.fetch_add(1, Ordering::Relaxed);
    }

    if slow || status.as_u16() >= 400 {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_secs = elapsed,
            slow,
            "Request completed with issues"
        );
    } else {
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_secs = elapsed,
            "Request completed"
        );
    }

    response
}
