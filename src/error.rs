//! Error types for leafling
//!
//! Adapters translate provider-specific failures into this taxonomy; cache
//! policies and handlers pass typed failures upward unchanged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Identification confidence gate rejected the image (400)
    #[error("{0}")]
    NotAPlant(String),

    /// Plant has no image to identify (400)
    #[error("Plant has no image to analyze. Please upload a photo first.")]
    NoImageAvailable,

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    AuthRequired(String),

    /// Ownership violation (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict, e.g. duplicate email (409)
    #[error("{0}")]
    Conflict(String),

    /// External provider quota exhausted (429)
    #[error("{0}")]
    QuotaExceeded(String),

    /// External provider failure: network, auth, unexpected shape (500)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error (500)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAPlant(_) | ApiError::NoImageAvailable | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Provider(_)
            | ApiError::Database(_)
            | ApiError::Internal(_)
            | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", message);
        }

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NotAPlant("nope".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NoImageAvailable.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::QuotaExceeded("slow down".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Forbidden("not yours".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Provider("upstream".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
