mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use helpers::{build_router, setup_test_app, setup_test_app_with};
use tower::ServiceExt;

const BASE_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
];

#[tokio::test]
async fn test_headers_on_success() {
    let app = setup_test_app();
    let response = app.client().get("/").await;
    response.assert_status_ok();

    for (name, value) in BASE_HEADERS {
        assert_eq!(response.headers()[name], value, "{}", name);
    }
    let csp = response.headers()["content-security-policy"].to_str().unwrap();
    assert!(csp.starts_with("default-src 'self'"));
    assert!(csp.contains("style-src 'self' 'unsafe-inline'"));
    assert!(!response.headers().contains_key("strict-transport-security"));

    assert!(response.headers().contains_key("x-request-id"));
    let process_time = response.headers()["x-process-time"].to_str().unwrap();
    assert!(process_time.parse::<f64>().is_ok());
}

#[tokio::test]
async fn test_headers_on_not_found() {
    let app = setup_test_app();
    let response = app.client().get("/does-not-exist").await;
    assert_eq!(response.status_code(), 404);
    for (name, value) in BASE_HEADERS {
        assert_eq!(response.headers()[name], value, "{}", name);
    }
}

#[tokio::test]
async fn test_hsts_behind_tls_proxy() {
    let app = setup_test_app();
    let response = app
        .client()
        .get("/health")
        .add_header("X-Forwarded-Proto", "https")
        .await;
    assert_eq!(
        response.headers()["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );
}

#[tokio::test]
async fn test_hsts_in_production() {
    let app = setup_test_app_with(|config| {
        config.environment = "production".to_string();
        config.cors_origins = vec!["https://app.example.com".to_string()];
    });
    let response = app.client().get("/health").await;
    assert!(response.headers().contains_key("strict-transport-security"));
}

#[tokio::test]
async fn test_client_request_id_is_echoed() {
    let app = setup_test_app();
    let response = app
        .client()
        .get("/health")
        .add_header("X-Request-ID", "req-1234")
        .await;
    assert_eq!(response.headers()["x-request-id"], "req-1234");
}

#[tokio::test]
async fn test_declared_oversized_upload_is_413() {
    let (router, _state, _dir) = build_router(|_| {});

    let request = Request::builder()
        .method("POST")
        .uri("/api/analysis/upload")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=xyz")
        .header(header::CONTENT_LENGTH, (11 * 1024 * 1024).to_string())
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_root_and_service_health() {
    let app = setup_test_app();

    let root: serde_json::Value = app.client().get("/").await.json();
    assert_eq!(root["service"], "oncoderma-api");
    assert_eq!(root["endpoints"]["upload"], "/api/analysis/upload");

    let info: serde_json::Value = app.client().get("/info").await.json();
    assert_eq!(info["environment"], "development");

    let health: serde_json::Value = app.client().get("/health").await.json();
    assert_eq!(health["status"], "healthy");
    assert!(health["performance"]["requests_count"].as_u64().unwrap() >= 3);
    assert!(health["performance"]["uptime_seconds"].is_u64());
    assert_eq!(health["performance"]["failed_requests"], 0);
    assert_eq!(health["performance"]["slow_requests"], 0);
}

#[tokio::test]
async fn test_health_counts_failed_requests() {
    let app = setup_test_app();

    app.client().get("/does-not-exist").await.assert_status(StatusCode::NOT_FOUND);
    app.client().get("/api/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);

    let health: serde_json::Value = app.client().get("/health").await.json();
    // The in-flight /health request is counted before it completes
    assert_eq!(health["performance"]["requests_count"], 3);
    assert_eq!(health["performance"]["failed_requests"], 2);
}
