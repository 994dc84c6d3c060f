//! Common error types for CropDx

use thiserror::Error;

/// Common result type for CropDx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the API service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing, unknown, expired or revoked credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Uniqueness violation (e.g. username already taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload could not be decoded as an image
    #[error("Invalid image format: {0}")]
    Image(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
