//! Domain error types for the TaskHub server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};

use crate::models::{ApiResponse, FieldError};

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Input failed one or more validation rules
    #[error("Validation failed ({0:?})")]
    Validation(Vec<FieldError>),

    /// Duplicate unique field
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Database(detail) => {
                tracing::error!("Database error: {}", detail);
                HttpResponse::build(status)
                    .json(ApiResponse::failure("An internal database error occurred"))
            }
            AppError::Validation(errors) => {
                HttpResponse::build(status).json(ApiResponse::invalid(errors.clone()))
            }
            AppError::NotFound(_) | AppError::Conflict(_) | AppError::Unauthorized(_) => {
                HttpResponse::build(status).json(ApiResponse::failure(&self.client_message()))
            }
        }
    }
}

impl AppError {
    /// Client-facing message for the envelope `error` field.
    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::Conflict(msg) | AppError::Unauthorized(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Database(format!("JSON serialization error: {}", err))
    }
}
