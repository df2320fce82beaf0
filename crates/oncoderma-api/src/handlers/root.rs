//! Service banner and service-level health

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use oncoderma_core::constants::{SERVICE_NAME, SERVICE_VERSION};
use serde_json::{json, Value};

use crate::constants::*;
use crate::state::AppState;

fn limits(state: &AppState) -> Value {
    let config = &state.config;
    json!({
        "max_file_size_mb": config.max_file_size_mb(),
        "allowed_types": config.allowed_content_types,
        "min_image_dimension": config.min_image_dimension,
        "rate_limit": {
            "calls": config.rate_limit_calls,
            "period_seconds": config.rate_limit_period_secs,
        },
    })
}

/// `GET /`
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "OncoDerma skin lesion analysis API",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "status": "running",
        "endpoints": {
            "health": "/health",
            "info": "/info",
            "upload": ANALYSIS_UPLOAD_PATH,
            "analysis_health": ANALYSIS_HEALTH_PATH,
            "model_info": ANALYSIS_MODEL_INFO_PATH,
            "stats": ANALYSIS_STATS_PATH,
            "login": AUTH_LOGIN_PATH,
            "logout": AUTH_LOGOUT_PATH,
            "me": AUTH_ME_PATH,
            "validate": AUTH_VALIDATE_PATH,
        },
        "limits": limits(&state),
    }))
}

/// `GET /info`
pub async fn info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "environment": state.config.environment,
        "features": [
            "image_validation",
            "risk_scoring",
            "bearer_auth",
            "rate_limiting",
            "response_cache",
        ],
        "limits": limits(&state),
        "timestamp": Utc::now(),
    }))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "environment": state.config.environment,
        "timestamp": Utc::now(),
        "performance": {
            "uptime_seconds": state.uptime_seconds(),
            "requests_count": state.metrics.requests_count(),
            "failed_requests": state.metrics.failed_count(),
            "slow_requests": state.metrics.slow_count(),
        },
    }))
}
