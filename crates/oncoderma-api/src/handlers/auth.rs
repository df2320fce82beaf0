//! Login, logout and session introspection

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::auth::models::{
    AuthenticatedUser, LoginRequest, LoginResponse, LogoutResponse, UserInfo, ValidateResponse,
};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

/// `POST /api/auth/login`
///
/// Credential problems are reported in the body with HTTP 200.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Ok(Json(LoginResponse::failed(
            "Username and password are required",
        )));
    }

    let Some(username) = state
        .authenticator
        .authenticate(&request.username, &request.password)
    else {
        tracing::warn!(username = %request.username.trim(), "Failed login attempt");
        return Ok(Json(LoginResponse::failed("Invalid username or password")));
    };

    let (token, session) = state.tokens.issue(&username).await;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: Some(token),
        user: Some(UserInfo {
            username: session.username,
            is_authenticated: true,
            login_time: session.login_time,
        }),
    }))
}

/// `POST /api/auth/logout`: revokes every session of the caller
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Json<LogoutResponse> {
    state.tokens.revoke_all(&user.username).await;
    Json(LogoutResponse {
        success: true,
        message: "Logout successful".to_string(),
    })
}

/// `GET /api/auth/me`
pub async fn me(user: AuthenticatedUser) -> Json<UserInfo> {
    Json(user.info())
}

/// `GET /api/auth/validate`
pub async fn validate(user: AuthenticatedUser) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        success: true,
        valid: true,
        user: user.info(),
    })
}
