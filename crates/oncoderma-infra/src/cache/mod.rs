//! In-memory response caching

pub mod response_cache;

pub use response_cache::{cache_key, CachedResponse, ResponseCache};
