//! Test helpers: build AppState and router for integration tests.
//!
//! Latency simulation is off and the scoring seed is fixed, so uploads return
//! immediately and deterministically.

pub mod fixtures;

use axum::Router;
use axum_test::TestServer;
use oncoderma_api::setup::routes;
use oncoderma_api::state::AppState;
use oncoderma_core::Config;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SCORING_SEED: u64 = 42;
pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "1234";

/// Test application: server, shared state and the owned upload directory.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Files left behind in the upload directory
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        upload_dir: upload_dir.to_path_buf(),
        simulate_latency: false,
        scoring_seed: Some(TEST_SCORING_SEED),
        demo_username: DEMO_USERNAME.to_string(),
        demo_password: DEMO_PASSWORD.to_string(),
        ..Config::default()
    }
}

/// Router plus state, for tests that drive the service directly.
pub fn build_router(customize: impl FnOnce(&mut Config)) -> (Router, Arc<AppState>, TempDir) {
    let upload_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(upload_dir.path());
    customize(&mut config);

    let state = Arc::new(AppState::from_config(config));
    let router = routes::setup_routes(state.clone()).unwrap();
    (router, state, upload_dir)
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

pub fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let (router, state, upload_dir) = build_router(customize);
    let server = TestServer::new(router).unwrap();
    TestApp {
        server,
        state,
        upload_dir,
    }
}

/// Log in with the demo credentials and return the token.
pub async fn login(client: &TestServer) -> String {
    let response = client
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": DEMO_USERNAME,
            "password": DEMO_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["token"].as_str().unwrap().to_string()
}
