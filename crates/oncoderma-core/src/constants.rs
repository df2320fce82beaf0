//! Service-wide constants
//!
//! Fixed limits of the analysis pipeline. Most of them can be overridden through
//! [`crate::Config`]; the values here are the defaults.

/// Service version reported by health and info endpoints
pub const SERVICE_VERSION: &str = "1.0.0";

/// Name reported by the service-level health check
pub const SERVICE_NAME: &str = "oncoderma-api";

/// Maximum accepted upload size in megabytes
pub const MAX_FILE_SIZE_MB: usize = 10;

/// Content types accepted by the upload validator
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Minimum accepted width and height in pixels
pub const MIN_IMAGE_DIMENSION: u32 = 50;

/// Directory (relative to the working directory) for scoped temp files
pub const UPLOAD_DIR: &str = "temp_uploads";

pub const RATE_LIMIT_CALLS: u32 = 100;
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

pub const CACHE_TTL_SECS: u64 = 300;
pub const CACHE_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;

/// Lifetime of an issued bearer token. Zero disables expiry.
pub const TOKEN_EXPIRE_HOURS: u64 = 24;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "1234";

/// Bounds of the fallback processing window, in seconds
pub const PROCESSING_TIME_MIN: f64 = 2.0;
pub const PROCESSING_TIME_MAX: f64 = 8.0;

pub const HTTP_CONCURRENCY_LIMIT: usize = 256;

/// Extra room granted to multipart framing on top of the max file size
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Requests slower than this are logged at warn level
pub const SLOW_REQUEST_THRESHOLD_SECS: f64 = 2.0;
