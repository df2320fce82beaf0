use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use oncoderma_core::AppError;

use crate::auth::models::AuthenticatedUser;
use crate::auth::token_store::token_prefix;
use crate::error::HttpAppError;
use crate::state::AppState;

/// The token from an `Authorization: Bearer <token>` header, if well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Require a live session; attaches [`AuthenticatedUser`] for the handler.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!(path = %request.uri().path(), "Missing or malformed bearer token");
        return HttpAppError(AppError::Unauthorized(
            "Missing or invalid authorization header".to_string(),
        ))
        .into_response();
    };

    let Some(session) = state.tokens.validate(token).await else {
        tracing::debug!(token_prefix = token_prefix(token), "Rejected unknown or expired token");
        return HttpAppError(AppError::Unauthorized(
            "Invalid or expired token".to_string(),
        ))
        .into_response();
    };

    request.extensions_mut().insert(AuthenticatedUser {
        username: session.username,
        login_time: session.login_time,
    });

    next.run(request).await
}
