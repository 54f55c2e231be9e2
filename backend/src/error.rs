//! Application error handling
//!
//! Every failure leaving a handler becomes `{"success": false, "error": "..."}`
//! with a status derived from the variant.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docvault_shared::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// Message returned for failures whose details must stay server-side
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again later";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Storage or ledger failure with a caller-facing message. The source is
    /// logged and never rendered.
    #[error("{message}")]
    Infrastructure {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn infrastructure(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApiError::Infrastructure {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Infrastructure { .. } | ApiError::Internal(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Infrastructure { message, source } => {
                error!(error = ?source, "{}", message);
                message.clone()
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status() {
        let error = ApiError::NotFound("Document not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unauthorized_renders_envelope() {
        let response = ApiError::Unauthorized("Invalid token".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "Invalid token"})
        );
    }

    #[tokio::test]
    async fn test_infrastructure_hides_source() {
        let error = ApiError::infrastructure(
            "Unable to register. Please try again later",
            anyhow::anyhow!("connection refused on 10.0.0.5:5432"),
        );
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Unable to register. Please try again later");
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let response = ApiError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], GENERIC_FAILURE_MESSAGE);
    }
}
