//! Bearer token middleware
//!
//! Reads `Authorization: Bearer <token>`, resolves the access token to a
//! user and stores a [`CurrentUser`] in the request extensions. Any failure
//! ends the request with 401.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use cropdx_common::auth::authenticate_access;
use cropdx_common::db::User;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller, available to protected handlers via `Extension`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Raw access token the request was made with
    pub access_token: String,
}

/// Extract the raw token from an `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(ApiError::Unauthorized("Invalid Authorization header".to_string()));
    }
    Ok(token)
}

/// Authentication middleware for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_string();
    let user = authenticate_access(&state.db, &token).await?;
    debug!(user_id = user.id, "Authenticated request");

    request.extensions_mut().insert(CurrentUser {
        user,
        access_token: token,
    });
    Ok(next.run(request).await)
}
