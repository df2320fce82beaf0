//! Configuration module
//!
//! Settings for the HTTP server, the upload pipeline and the in-memory stores.
//! Values come from the environment (optionally a `.env` file) and fall back to
//! the defaults in [`crate::constants`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Upload pipeline
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub min_image_dimension: u32,
    pub upload_dir: PathBuf,
    // Admission control
    pub rate_limit_calls: u32,
    pub rate_limit_period_secs: u64,
    pub trust_forwarded_headers: bool,
    pub http_concurrency_limit: usize,
    // Response cache
    pub cache_ttl_secs: u64,
    pub cache_max_body_bytes: usize,
    pub cache_sweep_interval_secs: u64,
    // Demo authentication
    pub demo_username: String,
    pub demo_password: String,
    pub token_expire_hours: u64,
    // Scoring engine
    pub processing_time_min: f64,
    pub processing_time_max: f64,
    pub simulate_latency: bool,
    pub scoring_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            server_port: 8000,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_content_types: ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            min_image_dimension: MIN_IMAGE_DIMENSION,
            upload_dir: PathBuf::from(UPLOAD_DIR),
            rate_limit_calls: RATE_LIMIT_CALLS,
            rate_limit_period_secs: RATE_LIMIT_PERIOD_SECS,
            trust_forwarded_headers: true,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            cache_ttl_secs: CACHE_TTL_SECS,
            cache_max_body_bytes: CACHE_MAX_BODY_BYTES,
            cache_sweep_interval_secs: CACHE_SWEEP_INTERVAL_SECS,
            demo_username: DEMO_USERNAME.to_string(),
            demo_password: DEMO_PASSWORD.to_string(),
            token_expire_hours: TOKEN_EXPIRE_HOURS,
            processing_time_min: PROCESSING_TIME_MIN,
            processing_time_max: PROCESSING_TIME_MAX,
            simulate_latency: true,
            scoring_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.environment.clone());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_content_types);

        let scoring_seed = match env::var("SCORING_SEED") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("SCORING_SEED must be an unsigned integer"))?,
            ),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| defaults.server_port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
            min_image_dimension: env::var("MIN_IMAGE_DIMENSION")
                .unwrap_or_else(|_| MIN_IMAGE_DIMENSION.to_string())
                .parse()
                .unwrap_or(MIN_IMAGE_DIMENSION),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            rate_limit_calls: env::var("RATE_LIMIT_CALLS")
                .unwrap_or_else(|_| RATE_LIMIT_CALLS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_CALLS),
            rate_limit_period_secs: env::var("RATE_LIMIT_PERIOD_SECS")
                .unwrap_or_else(|_| RATE_LIMIT_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_PERIOD_SECS),
            trust_forwarded_headers: parse_bool("TRUST_FORWARDED_HEADERS", true),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| CACHE_TTL_SECS.to_string())
                .parse()
                .unwrap_or(CACHE_TTL_SECS),
            cache_max_body_bytes: env::var("CACHE_MAX_BODY_BYTES")
                .unwrap_or_else(|_| CACHE_MAX_BODY_BYTES.to_string())
                .parse()
                .unwrap_or(CACHE_MAX_BODY_BYTES),
            cache_sweep_interval_secs: env::var("CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| CACHE_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(CACHE_SWEEP_INTERVAL_SECS),
            demo_username: env::var("DEMO_USERNAME").unwrap_or(defaults.demo_username),
            demo_password: env::var("DEMO_PASSWORD").unwrap_or(defaults.demo_password),
            token_expire_hours: env::var("TOKEN_EXPIRE_HOURS")
                .unwrap_or_else(|_| TOKEN_EXPIRE_HOURS.to_string())
                .parse()
                .unwrap_or(TOKEN_EXPIRE_HOURS),
            processing_time_min: env::var("PROCESSING_TIME_MIN")
                .unwrap_or_else(|_| PROCESSING_TIME_MIN.to_string())
                .parse()
                .unwrap_or(PROCESSING_TIME_MIN),
            processing_time_max: env::var("PROCESSING_TIME_MAX")
                .unwrap_or_else(|_| PROCESSING_TIME_MAX.to_string())
                .parse()
                .unwrap_or(PROCESSING_TIME_MAX),
            simulate_latency: parse_bool("SIMULATE_LATENCY", true),
            scoring_seed,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES must not be empty"));
        }

        if self.rate_limit_calls == 0 || self.rate_limit_period_secs == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_CALLS and RATE_LIMIT_PERIOD_SECS must be greater than 0"
            ));
        }

        if self.cache_sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "CACHE_SWEEP_INTERVAL_SECS must be greater than 0"
            ));
        }

        if self.processing_time_min < 0.0 || self.processing_time_min > self.processing_time_max
        {
            return Err(anyhow::anyhow!(
                "PROCESSING_TIME_MIN must be non-negative and not exceed PROCESSING_TIME_MAX"
            ));
        }

        if self.demo_username.trim().is_empty() || self.demo_password.is_empty() {
            return Err(anyhow::anyhow!(
                "DEMO_USERNAME and DEMO_PASSWORD must not be empty"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    /// Token lifetime; `None` when expiry is disabled
    pub fn token_ttl(&self) -> Option<Duration> {
        (self.token_expire_hours > 0).then(|| Duration::from_secs(self.token_expire_hours * 3600))
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.rate_limit_calls, 100);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.token_ttl(), Some(Duration::from_secs(24 * 3600)));
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let config = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            environment: "production".to_string(),
            cors_origins: vec!["https://www.oncoderma.com".to_string()],
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_processing_window_rejected() {
        let config = Config {
            processing_time_min: 9.0,
            processing_time_max: 8.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_token_expiry_disables_ttl() {
        let config = Config {
            token_expire_hours: 0,
            ..Config::default()
        };
        assert_eq!(config.token_ttl(), None);
    }
}
