//! HTTP error mapping
//!
//! Every error leaves the service as `{"error": "<message>"}`. Storage and
//! I/O failures are logged in full and reported to clients generically.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. username already taken
    #[error("{0}")]
    Conflict(String),

    /// Upload larger than `max_upload_bytes` (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Dependency unavailable (503)
    #[error("{0}")]
    Unavailable(String),

    /// Internal server error (500); the detail is logged, not returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<cropdx_common::Error> for ApiError {
    fn from(err: cropdx_common::Error) -> Self {
        use cropdx_common::Error;

        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Image(_) => ApiError::BadRequest(err.to_string()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string());
        }
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<axum::extract::multipart::MultipartRejection> for ApiError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_error_mapping() {
        let cases = [
            (cropdx_common::Error::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (cropdx_common::Error::Image("truncated".into()), StatusCode::BAD_REQUEST),
            (cropdx_common::Error::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (cropdx_common::Error::NotFound("disease 9".into()), StatusCode::NOT_FOUND),
            (cropdx_common::Error::Conflict("taken".into()), StatusCode::CONFLICT),
            (cropdx_common::Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_image_error_message_kept() {
        let err = ApiError::from(cropdx_common::Error::Image("unsupported".into()));
        assert_eq!(err.to_string(), "Invalid image format: unsupported");
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("Token is expired".into()).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
