use oncoderma_core::constants::SERVICE_NAME;
use oncoderma_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    oncoderma_infra::init_telemetry(SERVICE_NAME, &config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, router) = oncoderma_api::setup::initialize_app(config.clone()).await?;

    oncoderma_api::setup::server::start_server(&config, state, router).await?;

    Ok(())
}
