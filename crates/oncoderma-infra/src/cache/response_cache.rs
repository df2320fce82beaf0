use axum::http::{Method, Uri};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use oncoderma_core::Config;

use crate::tasks::spawn_periodic;

const DEFAULT_MAX_ENTRIES: usize = 1_000;

/// A stored response body with the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug)]
struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// TTL cache for small read-only responses.
///
/// Expired entries are dropped lazily on lookup and eagerly by
/// [`ResponseCache::spawn_sweeper`].
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Duration,
    max_body_bytes: usize,
    max_entries: usize,
}

/// Cache key for a request: method plus path and query.
pub fn cache_key(method: &Method, uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{} {}", method, target)
}

impl ResponseCache {
    pub fn new(default_ttl: Duration, max_body_bytes: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
            max_body_bytes,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_ttl(), config.cache_max_body_bytes)
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.response.clone()),
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a concurrent put may have refreshed it
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    /// Store `response` for `ttl`. Bodies above the size ceiling are refused.
    pub async fn put(&self, key: impl Into<String>, response: CachedResponse, ttl: Duration) -> bool {
        if response.body.len() > self.max_body_bytes {
            return false;
        }

        let key = key.into();
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_expired(now));
            if entries.len() >= self.max_entries {
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(evict) = soonest {
                    entries.remove(&evict);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                response,
                expires_at: now + ttl,
            },
        );
        true
    }

    pub async fn put_default(&self, key: impl Into<String>, response: CachedResponse) -> bool {
        self.put(key, response, self.default_ttl).await
    }

    /// Remove every expired entry. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "Swept expired cache entries");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub fn spawn_sweeper(&self, period: Duration, cancel_token: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        spawn_periodic("response_cache_sweep", period, cancel_token, move || {
            let cache = cache.clone();
            async move {
                cache.sweep_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_before_ttl_returns_stored_body() {
        let cache = ResponseCache::new(Duration::from_secs(300), 1024);
        assert!(cache.put("GET /a", json(r#"{"ok":true}"#), Duration::from_secs(300)).await);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("GET /a").await, Some(json(r#"{"ok":true}"#)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_is_absent() {
        let cache = ResponseCache::new(Duration::from_secs(300), 1024);
        cache.put_default("GET /a", json("{}")).await;

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(cache.get("GET /a").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_refused() {
        let cache = ResponseCache::new(Duration::from_secs(300), 4);
        assert!(!cache.put_default("GET /big", json("12345")).await);
        assert!(cache.put_default("GET /small", json("1234")).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = ResponseCache::new(Duration::from_secs(300), 1024);
        cache.put("GET /short", json("{}"), Duration::from_secs(10)).await;
        cache.put("GET /long", json("{}"), Duration::from_secs(600)).await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.sweep_expired().await, 1);
        assert!(cache.get("GET /long").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts_without_lookups() {
        let cache = ResponseCache::new(Duration::from_secs(5), 1024);
        let token = CancellationToken::new();
        let handle = cache.spawn_sweeper(Duration::from_secs(60), token.clone());

        cache.put_default("GET /a", json("{}")).await;
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty().await);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_evicts_soonest_expiring() {
        let cache = ResponseCache::new(Duration::from_secs(300), 1024).with_max_entries(2);
        cache.put("GET /1", json("1"), Duration::from_secs(100)).await;
        cache.put("GET /2", json("2"), Duration::from_secs(50)).await;
        cache.put("GET /3", json("3"), Duration::from_secs(200)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("GET /2").await.is_none());
        assert!(cache.get("GET /1").await.is_some());
    }

    #[test]
    fn test_cache_key_includes_query() {
        let uri: Uri = "/api/analysis/health?verbose=1".parse().unwrap();
        assert_eq!(
            cache_key(&Method::GET, &uri),
            "GET /api/analysis/health?verbose=1"
        );
    }
}
