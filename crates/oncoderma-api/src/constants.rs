//! Route paths

pub const API_PREFIX: &str = "/api";

pub const ANALYSIS_UPLOAD_PATH: &str = "/api/analysis/upload";
pub const ANALYSIS_HEALTH_PATH: &str = "/api/analysis/health";
pub const ANALYSIS_MODEL_INFO_PATH: &str = "/api/analysis/model-info";
pub const ANALYSIS_STATS_PATH: &str = "/api/analysis/stats";

pub const AUTH_LOGIN_PATH: &str = "/api/auth/login";
pub const AUTH_LOGOUT_PATH: &str = "/api/auth/logout";
pub const AUTH_ME_PATH: &str = "/api/auth/me";
pub const AUTH_VALIDATE_PATH: &str = "/api/auth/validate";
