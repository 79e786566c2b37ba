//! Error types for the PDF engine server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pdf::EngineError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Processing failed: {message}")]
    Processing {
        job_id: Option<i64>,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the job that recorded this failure, if it is a processing failure.
    pub fn with_job(self, id: i64) -> Self {
        match self {
            AppError::Processing { message, .. } => AppError::Processing {
                job_id: Some(id),
                message,
            },
            other => other,
        }
    }

    /// Short machine-readable kind used in response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidParameter { .. } => "invalid_parameter",
            AppError::MissingParameter(_) => "missing_parameter",
            AppError::FileNotFound(_) => "file_not_found",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Processing { .. } => "processing_failed",
            AppError::Database(_) => "database_error",
            AppError::Io(_) => "io_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::InvalidParameter { .. }
            | AppError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AppError::FileNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Processing { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::FileNotFound(name) => AppError::FileNotFound(name),
            other => AppError::Processing {
                job_id: None,
                message: other.to_string(),
            },
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                "IO error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let job_id = match &self {
            AppError::Processing { job_id, .. } => *job_id,
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.kind(),
            message,
            job_id,
            details: if cfg!(debug_assertions) && status.is_server_error() {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
