//! Simulated processing latency
//!
//! The engine never sleeps directly; it asks a [`LatencySimulator`] to pause so
//! that tests and benchmarks can turn the waits off.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait LatencySimulator: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real wall-clock waits on the tokio timer. Cancelled with the enclosing future.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl LatencySimulator for TokioDelay {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[async_trait]
impl LatencySimulator for NoDelay {
    async fn pause(&self, _duration: Duration) {}
}
