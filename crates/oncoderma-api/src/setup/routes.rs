//! Route configuration and setup

use crate::auth::auth_middleware;
use crate::constants::*;
use crate::error::{handle_panic, HttpAppError};
use crate::handlers;
use crate::middleware::{
    rate_limit_middleware, request_metrics_middleware, response_cache_middleware,
    upload_guard_middleware,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use oncoderma_core::constants::MULTIPART_OVERHEAD_BYTES;
use oncoderma_core::{AppError, Config};
use oncoderma_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full router with its middleware stack.
///
/// Outermost first: security headers, request id, tracing, request metrics,
/// CORS, rate limiting, panic recovery, concurrency limit. Every response,
/// including 429 and recovered panics, passes back through the headers layers.
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let config = state.config.clone();
    let cors = setup_cors(&config)?;

    let upload_body_limit = config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;
    let upload_routes = Router::new()
        .route(
            ANALYSIS_UPLOAD_PATH,
            post(handlers::analysis::upload_image),
        )
        .route_layer(from_fn_with_state(state.clone(), upload_guard_middleware))
        .layer(DefaultBodyLimit::max(upload_body_limit));

    let informational_routes = Router::new()
        .route(
            ANALYSIS_HEALTH_PATH,
            get(handlers::analysis::analysis_health),
        )
        .route(ANALYSIS_MODEL_INFO_PATH, get(handlers::analysis::model_info))
        .route(ANALYSIS_STATS_PATH, get(handlers::analysis::analysis_stats))
        .route_layer(from_fn_with_state(
            state.cache.clone(),
            response_cache_middleware,
        ));

    let protected_routes = Router::new()
        .route(AUTH_LOGOUT_PATH, post(handlers::auth::logout))
        .route(AUTH_ME_PATH, get(handlers::auth::me))
        .route(AUTH_VALIDATE_PATH, get(handlers::auth::validate))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/", get(handlers::root::root))
        .route("/info", get(handlers::root::info))
        .route("/health", get(handlers::root::health))
        .route(AUTH_LOGIN_PATH, post(handlers::auth::login));

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        upload_body_limit,
        rate_limit_calls = config.rate_limit_calls,
        rate_limit_period_secs = config.rate_limit_period_secs,
        "Routes configured"
    );

    let app = public_routes
        .merge(upload_routes)
        .merge(informational_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit.max(1)))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors)
        .layer(from_fn_with_state(
            state.metrics.clone(),
            request_metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .layer(from_fn_with_state(
            state.security_headers.clone(),
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

async fn not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Endpoint not found".to_string()))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let exposed = [
        HeaderName::from_static("x-request-id"),
        HeaderName::from_static("x-process-time"),
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderName::from_static("x-ratelimit-remaining"),
    ];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new().allow_origin(origins)
    };

    Ok(cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers(exposed))
}
