//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use oncoderma_core::Config;
use oncoderma_infra::spawn_periodic;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Validate the config, prepare the upload directory and build state + router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;
    tracing::info!(environment = %config.environment, "Configuration loaded and validated");

    let state = Arc::new(AppState::from_config(config));

    state
        .pipeline
        .temp_files()
        .ensure_dir()
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                state.config.upload_dir.display()
            )
        })?;

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Start the cache, session and rate-window sweeps, bound to `state.shutdown`.
pub fn spawn_background_tasks(state: &AppState) -> Vec<JoinHandle<()>> {
    let sweep_interval = state.config.cache_sweep_interval();

    let cache_sweep = state
        .cache
        .spawn_sweeper(sweep_interval, state.shutdown.clone());

    let token_sweep = state
        .tokens
        .spawn_sweeper(sweep_interval, state.shutdown.clone());

    let limiter = state.rate_limiter.clone();
    let window_sweep = spawn_periodic(
        "rate_window_sweep",
        state.rate_limiter.period(),
        state.shutdown.clone(),
        move || {
            let limiter = limiter.clone();
            async move {
                limiter.cleanup_idle().await;
            }
        },
    );

    tracing::info!(
        sweep_interval_secs = sweep_interval.as_secs(),
        rate_window_secs = state.rate_limiter.period().as_secs(),
        "Background sweeps started"
    );

    vec![cache_sweep, token_sweep, window_sweep]
}
