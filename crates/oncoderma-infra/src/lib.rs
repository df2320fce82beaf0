//! OncoDerma Infrastructure Library
//!
//! Shared infrastructure used by the API service:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization
//! - Sliding-window rate limiting
//! - TTL response cache
//! - Cancellable background sweeps

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "cache")]
pub mod cache;

pub mod tasks;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeadersConfig,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::SlidingWindowLimiter;

#[cfg(feature = "cache")]
pub use cache::{CachedResponse, ResponseCache};

pub use tasks::spawn_periodic;
