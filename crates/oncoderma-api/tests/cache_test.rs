mod helpers;

use helpers::{login, setup_test_app, setup_test_app_with};
use serde_json::Value;

#[tokio::test]
async fn test_informational_route_is_served_from_cache() {
    let app = setup_test_app();
    let client = app.client();

    let first = client.get("/api/analysis/model-info").await;
    first.assert_status_ok();
    assert_eq!(first.headers()["x-cache"], "MISS");

    let second = client.get("/api/analysis/model-info").await;
    second.assert_status_ok();
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.text(), first.text());
    assert!(second.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    // Replayed responses still go through the outer layers
    assert!(second.headers().contains_key("x-request-id"));
    assert_eq!(second.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_authorized_requests_bypass_cache() {
    let app = setup_test_app();
    let client = app.client();
    let token = login(client).await;

    client.get("/api/analysis/health").await.assert_status_ok();

    let response = client
        .get("/api/analysis/health")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    assert!(!response.headers().contains_key("x-cache"));
}

#[tokio::test]
async fn test_query_string_is_part_of_key() {
    let app = setup_test_app();
    let client = app.client();

    client.get("/api/analysis/model-info").await;
    let other = client.get("/api/analysis/model-info?v=2").await;
    assert_eq!(other.headers()["x-cache"], "MISS");
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire_after_ttl() {
    let app = setup_test_app_with(|config| config.cache_ttl_secs = 300);
    let client = app.client();

    client.get("/api/analysis/model-info").await;
    assert_eq!(
        client.get("/api/analysis/model-info").await.headers()["x-cache"],
        "HIT"
    );

    tokio::time::advance(std::time::Duration::from_secs(301)).await;
    assert_eq!(
        client.get("/api/analysis/model-info").await.headers()["x-cache"],
        "MISS"
    );
}

#[tokio::test]
async fn test_oversized_bodies_are_not_cached() {
    let app = setup_test_app_with(|config| config.cache_max_body_bytes = 16);
    let client = app.client();

    client.get("/api/analysis/model-info").await;
    let second = client.get("/api/analysis/model-info").await;
    assert_eq!(second.headers()["x-cache"], "MISS");
    assert_eq!(app.state.cache.len().await, 0);

    let body: Value = second.json();
    assert_eq!(body["model_name"], "SkinCancer AI Detector");
}

#[tokio::test]
async fn test_uploads_are_never_cached() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/api/analysis/upload")
        .multipart(helpers::fixtures::file_form(
            helpers::fixtures::png(80, 80),
            "mole.png",
            "image/png",
        ))
        .await;
    assert!(!response.headers().contains_key("x-cache"));
    assert_eq!(app.state.cache.len().await, 0);
}
