use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEVELOPMENT_FILTER: &str = "oncoderma=debug,tower_http=debug,axum=info";
const PRODUCTION_FILTER: &str = "info";

fn default_filter(environment: &str) -> &'static str {
    if environment.eq_ignore_ascii_case("production") {
        PRODUCTION_FILTER
    } else {
        DEVELOPMENT_FILTER
    }
}

/// Initialize tracing. `RUST_LOG` overrides the environment default.
///
/// Production emits JSON lines; everything else uses the human-readable formatter.
pub fn init_telemetry(
    service_name: &str,
    environment: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    if environment.eq_ignore_ascii_case("production") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
    }

    tracing::info!(
        service = service_name,
        environment = environment,
        "Tracing initialized"
    );
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
