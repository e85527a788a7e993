//! Error types for feedproxy
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Feed ID rejected by the configured whitelist (403)
    #[error("Feed ID {0} is not in the whitelist")]
    NotWhitelisted(String),

    /// Upstream confirmed the feed does not exist (404)
    #[error("Feed does not exist upstream")]
    FeedNotExists,

    /// Upstream fetch failed: transport error, non-2xx status or
    /// unparseable payload (502)
    #[error("Upstream fetch failed: {0}")]
    FetchFailed(String),

    /// Post referenced during image resolution is unknown (500)
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Image download or file write failed (500)
    #[error("Image resolution failed: {0}")]
    ImageResolution(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = match &self {
            AppError::NotWhitelisted(_) => (StatusCode::FORBIDDEN, self.to_string(), "whitelist"),
            AppError::FeedNotExists => (StatusCode::NOT_FOUND, self.to_string(), "not_exists"),
            AppError::FetchFailed(_) => (StatusCode::BAD_GATEWAY, self.to_string(), "fetch"),
            AppError::PostNotFound(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                "post_not_found",
            ),
            AppError::ImageResolution(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "image")
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
