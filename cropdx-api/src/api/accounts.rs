//! Registration, login, token refresh, logout and current user

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use cropdx_common::auth::{
    hash_password, issue_token_pair, revoke, rotate_refresh, validate_password, verify_login,
};
use cropdx_common::db::{users, validate_username, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid Credentials";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_expert: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
}

/// Login and registration response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub access: String,
    pub refresh: String,
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;

    validate_username(&request.username)?;
    validate_password(&request.password, &request.username)?;

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let user = users::create_user(
        &state.db,
        &request.username,
        &password_hash,
        request.is_expert,
    )
    .await?;
    let pair = issue_token_pair(&state.db, user.id, state.lifetimes).await?;

    info!("Registered user {} (id {})", user.username, user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.summary(),
            access: pair.access,
            refresh: pair.refresh,
        }),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(request) = payload?;

    let invalid = || ApiError::BadRequest(INVALID_CREDENTIALS.to_string());

    let user = users::find_by_username(&state.db, &request.username).await?;

    // Unknown usernames still pay for a verification
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = request.password;
    let verified =
        tokio::task::spawn_blocking(move || verify_login(&password, stored_hash.as_deref()))
            .await?;
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(invalid()),
    };

    let pair = issue_token_pair(&state.db, user.id, state.lifetimes).await?;
    info!("User {} logged in", user.username);

    Ok(Json(AuthResponse {
        user: user.summary(),
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// POST /api/token/refresh
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(request) = payload?;
    let raw = request
        .refresh
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("refresh: This field is required.".to_string()))?;

    let (user, pair) = rotate_refresh(&state.db, &raw, state.lifetimes).await?;

    Ok(Json(AuthResponse {
        user: user.summary(),
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// POST /api/logout
///
/// Revokes the access token used for the call and, when given, the refresh
/// token in the body. The body is optional.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let request: LogoutRequest = if body.is_empty() {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
    };

    revoke(&state.db, &current.access_token).await?;
    if let Some(refresh) = request.refresh.filter(|token| !token.is_empty()) {
        revoke(&state.db, &refresh).await?;
    }

    info!("User {} logged out", current.user.username);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserSummary> {
    Json(current.user.summary())
}

/// Routes reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/auth/register", post(register))
        .route("/api/login", post(login))
        .route("/api/auth/login", post(login))
        .route("/api/token/refresh", post(refresh))
        .route("/api/auth/refresh", post(refresh))
}

/// Routes that need an authenticated caller
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/logout", post(logout))
        .route("/api/auth/logout", post(logout))
        .route("/api/me", get(me))
}
