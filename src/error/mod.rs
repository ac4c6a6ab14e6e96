//! Unified error handling for LeadScout Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// The first nine variants are the authorization taxonomy and are ordinary
/// control flow at the HTTP boundary. Only `Database` and `Internal`
/// represent unexpected faults.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, malformed, expired or tampered credential. The message is
    /// deliberately uniform; the actual cause stays in server logs.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("account is inactive")]
    Inactive,

    #[error("account is pending approval")]
    Unapproved,

    /// Authenticated but lacking the required capability. Carries the
    /// capability name for diagnostics.
    #[error("missing required capability: {0}")]
    InsufficientPrivilege(String),

    /// Authenticated, capability held, but the resource belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on email / role name / permission name.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Attempted mutation of a protected superadmin invariant. Raised
    /// before any write is issued.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg.clone())
            }
            AppError::Inactive => (
                StatusCode::FORBIDDEN,
                "inactive",
                "Account is inactive".to_string(),
            ),
            AppError::Unapproved => (
                StatusCode::FORBIDDEN,
                "unapproved",
                "Account is pending administrator approval".to_string(),
            ),
            AppError::InsufficientPrivilege(capability) => (
                StatusCode::FORBIDDEN,
                "insufficient_privilege",
                format!("Missing required capability: {}", capability),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::PolicyViolation(msg) => {
                (StatusCode::BAD_REQUEST, "policy_violation", msg.clone())
            }
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "invalid", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Conflict("Resource already exists".to_string());
            }
        }
        AppError::Database(err)
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Invalid(errors.to_string())
    }
}
