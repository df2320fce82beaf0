use axum::http::header;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use oncoderma_core::AppError;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn declared_length(request: &Request) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Cheap checks on the upload route before any body is read.
pub async fn upload_guard_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_multipart(&request) {
        return HttpAppError(AppError::BadRequest(
            "Upload must be sent as multipart/form-data".to_string(),
        ))
        .into_response();
    }

    let max = state.config.max_file_size_bytes as u64;
    if let Some(length) = declared_length(&request) {
        if length > max {
            tracing::debug!(declared = length, max, "Rejected oversized upload before reading");
            return HttpAppError(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size: {}MB",
                state.config.max_file_size_mb()
            )))
            .into_response();
        }
    }

    next.run(request).await
}
