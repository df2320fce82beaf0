//! API-level middleware

pub mod metrics;
pub mod rate_limit;
pub mod response_cache;
pub mod upload_guard;

pub use metrics::{request_metrics_middleware, RequestMetrics};
pub use rate_limit::rate_limit_middleware;
pub use response_cache::response_cache_middleware;
pub use upload_guard::upload_guard_middleware;
