//! Server startup and graceful shutdown

use anyhow::Result;
use axum::Router;
use oncoderma_core::Config;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::setup::spawn_background_tasks;
use crate::state::AppState;

/// Serve `app` until ctrl-c/SIGTERM, then stop the background sweeps.
pub async fn start_server(config: &Config, state: Arc<AppState>, app: Router) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let sweeps = spawn_background_tasks(&state);

    tracing::info!(
        max_file_size_mb = config.max_file_size_mb(),
        allowed_types = %config.allowed_content_types.join(","),
        min_image_dimension = config.min_image_dimension,
        upload_dir = %config.upload_dir.display(),
        "Server ready and accepting connections"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.shutdown.cancel();
    for handle in sweeps {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    oncoderma_infra::shutdown_telemetry().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
