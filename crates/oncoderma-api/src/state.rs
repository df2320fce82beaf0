//! Application state shared by handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use oncoderma_core::Config;
use oncoderma_infra::{ResponseCache, SecurityHeadersConfig, SlidingWindowLimiter};
use oncoderma_processing::AnalysisPipeline;
use tokio_util::sync::CancellationToken;

use crate::auth::{Authenticator, TokenStore};
use crate::middleware::metrics::RequestMetrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<AnalysisPipeline>,
    pub authenticator: Arc<Authenticator>,
    pub tokens: TokenStore,
    pub rate_limiter: SlidingWindowLimiter,
    pub cache: ResponseCache,
    pub security_headers: SecurityHeadersConfig,
    pub metrics: Arc<RequestMetrics>,
    pub started_at: Instant,
    /// Cancels every background sweep on shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the state for `config` around an already-constructed pipeline.
    pub fn new(config: Config, pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            authenticator: Arc::new(Authenticator::from_config(&config)),
            tokens: TokenStore::new(config.token_ttl()),
            rate_limiter: SlidingWindowLimiter::from_config(&config),
            cache: ResponseCache::from_config(&config),
            security_headers: SecurityHeadersConfig::new(config.is_production()),
            metrics: Arc::new(RequestMetrics::default()),
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: Config) -> Self {
        let pipeline = AnalysisPipeline::from_config(&config);
        Self::new(config, pipeline)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
