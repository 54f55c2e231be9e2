//! API request and response types

use crate::models::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Success envelope: `{"success": true, "data": ..., "meta"?: ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn paginated(data: T, meta: PaginationMeta) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

/// Error envelope: `{"success": false, "error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Pagination metadata attached to list responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Expected string to match 'email' format"))]
    pub email: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    pub fullname: String,
    #[validate(email(message = "Expected string to match 'email' format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

/// Body of `/auth/refresh-token`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Body of `/auth/logout`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Sanitized user profile. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: Role,
}

/// Access/refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
}

/// Plain message payload (logout, delete)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Create a document from JSON (file already stored elsewhere)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub number: String,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub title: String,
    pub availability: bool,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub file_path: String,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub project: String,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub discipline: String,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub wp: String,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub lookup: String,
}

/// Partial document update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub title: Option<String>,
    pub availability: Option<bool>,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub file_path: Option<String>,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub project: Option<String>,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub discipline: Option<String>,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub wp: Option<String>,
    #[validate(length(min = 1, message = "Expected string length greater or equal to 1"))]
    pub lookup: Option<String>,
}

impl UpdateDocumentRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.availability.is_none()
            && self.file_path.is_none()
            && self.project.is_none()
            && self.discipline.is_none()
            && self.wp.is_none()
            && self.lookup.is_none()
    }
}

/// Query string of `GET /documents`
///
/// `page` and `limit` stay strings here so that the pagination helper can
/// reject non-numeric input with a readable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub project: Option<String>,
    pub discipline: Option<String>,
}
