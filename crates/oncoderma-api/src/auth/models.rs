use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use oncoderma_core::AppError;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::bearer_token;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub username: String,
    pub is_authenticated: bool,
    pub login_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

impl LoginResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            token: None,
            user: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Identity attached to the request by [`crate::auth::auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub login_time: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn info(&self) -> UserInfo {
        UserInfo {
            username: self.username.clone(),
            is_authenticated: true,
            login_time: self.login_time,
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            })
    }
}

/// Caller identity on routes where authentication is optional.
///
/// A missing, malformed or unknown token yields `OptionalUser(None)` rather
/// than a rejection.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(OptionalUser(Some(user.clone())));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(OptionalUser(None));
        };

        let user = state
            .tokens
            .validate(token)
            .await
            .map(|session| AuthenticatedUser {
                username: session.username,
                login_time: session.login_time,
            });
        Ok(OptionalUser(user))
    }
}
