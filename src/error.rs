// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    // 422 Unprocessable Entity (answers that do not fit the quiz)
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    // 400 Bad Request
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    // 500 Internal Server Error, detail is only logged
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    // 409 Conflict (delete blocked by grade history)
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    // 409 Conflict (e.g., duplicate quiz name)
    #[error("Conflict: {0}")]
    Conflict(String),

    // 401 Unauthorized
    #[error("Unauthorized: {0}")]
    AuthError(String),

    // 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            AppError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::IntegrityViolation(_) => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::PersistenceFailure(msg) => {
                tracing::error!("Persistence failure: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::NotFound(msg)
            | AppError::InvalidSubmission(msg)
            | AppError::ValidationFailure(msg)
            | AppError::IntegrityViolation(msg)
            | AppError::Conflict(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg) => msg,
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::PersistenceFailure(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationFailure(err.to_string())
    }
}
