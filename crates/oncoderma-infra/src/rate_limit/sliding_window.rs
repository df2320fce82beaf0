use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use oncoderma_core::Config;

const DEFAULT_SHARD_COUNT: usize = 16;

type WindowShard = Arc<Mutex<HashMap<String, VecDeque<Instant>>>>;

/// Sliding-window limiter keyed by client identifier.
///
/// Each client keeps the timestamps of its admitted calls inside the trailing
/// window. Clients are spread across shards so concurrent requests from
/// different clients rarely contend on the same lock; calls for one client are
/// serialized by its shard.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    shards: Vec<WindowShard>,
    shard_count: usize,
    limit: u32,
    period: Duration,
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("shard_count", &self.shard_count)
            .field("limit", &self.limit)
            .field("period", &self.period)
            .finish()
    }
}

impl SlidingWindowLimiter {
    pub fn new(limit: u32, period: Duration) -> Self {
        Self::with_shards(limit, period, DEFAULT_SHARD_COUNT)
    }

    pub fn with_shards(limit: u32, period: Duration, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            limit,
            period,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_calls, config.rate_limit_period())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, period: Duration) {
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= period {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit or deny one call for `key`.
    ///
    /// Returns the calls still available in the window on admission, or how
    /// long until the oldest recorded call leaves the window on denial.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let now = Instant::now();
        let shard = &self.shards[self.shard_index(key)];
        let mut windows = shard.lock().await;
        let window = windows.entry(key.to_string()).or_default();

        Self::prune(window, now, self.period);

        let used = window.len() as u32;
        if used < self.limit {
            window.push_back(now);
            return Ok(self.limit - used - 1);
        }

        let retry_after = window
            .front()
            .map(|oldest| self.period.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.period);
        tracing::warn!(
            client = key,
            limit = self.limit,
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded"
        );
        Err(retry_after)
    }

    pub async fn allow(&self, key: &str) -> bool {
        self.check(key).await.is_ok()
    }

    /// Drop clients with no calls left inside the window. Returns how many were removed.
    pub async fn cleanup_idle(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut windows = shard.lock().await;
            let before = windows.len();
            windows.retain(|_, window| {
                Self::prune(window, now, self.period);
                !window.is_empty()
            });
            removed += before - windows.len();
        }
        if removed > 0 {
            tracing::debug!(removed, "Cleaned up idle rate-limit windows");
        }
        removed
    }

    pub async fn tracked_clients(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_denies_call_after_limit() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));

        assert_eq!(limiter.check("10.0.0.1").await, Ok(2));
        assert_eq!(limiter.check("10.0.0.1").await, Ok(1));
        assert_eq!(limiter.check("10.0.0.1").await, Ok(0));
        assert!(!limiter.allow("10.0.0.1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.allow("a").await);
        assert!(!limiter.allow("a").await);
        assert!(limiter.allow("b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_resumes_after_window() {
        let limiter = SlidingWindowLimiter::new(100, Duration::from_secs(60));

        for _ in 0..100 {
            assert!(limiter.allow("client").await);
        }
        let retry_after = limiter.check("client").await.unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(
            limiter.check("client").await.unwrap_err(),
            Duration::from_secs(30)
        );

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.allow("client").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_per_call() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(10));

        assert!(limiter.allow("c").await);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.allow("c").await);
        assert!(!limiter.allow("c").await);

        // First call leaves the window; the second is still inside it
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(limiter.allow("c").await);
        assert!(!limiter.allow("c").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_idle_clients() {
        let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(60));
        limiter.allow("old").await;
        tokio::time::advance(Duration::from_secs(45)).await;
        limiter.allow("recent").await;
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(limiter.cleanup_idle().await, 1);
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_never_exceed_limit() {
        let limiter = SlidingWindowLimiter::new(50, Duration::from_secs(60));
        let mut handles = Vec::new();
        for _ in 0..200 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.allow("shared").await }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 50);
    }
}
