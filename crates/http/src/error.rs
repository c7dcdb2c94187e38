//! Error handling for the catalog HTTP layer

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("conflict: {message}")]
    Conflict {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a conflict error with a domain-specific code
    pub fn conflict(
        code: impl Into<String>,
        details: Vec<serde_json::Value>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            details,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the serialized body, stamping a fresh trace id and timestamp
    pub fn into_body(self) -> ErrorBody {
        let trace_id = Uuid::new_v4().to_string();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            }
            | AppError::Conflict {
                details,
                code,
                message,
            } => (code, message, details),
            AppError::NotFound { message, code } | AppError::BadRequest { message, code } => {
                (code, message, Vec::new())
            }
            AppError::Internal(e) => {
                // Hide internal error details outside debug builds
                let message = if cfg!(debug_assertions) {
                    format!("{:#}", e)
                } else {
                    "An internal server error occurred".to_string()
                };
                ("internal_error".to_string(), message, Vec::new())
            }
        };

        ErrorBody {
            code,
            message,
            details,
            trace_id,
            timestamp,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.into_body();

        if status.is_server_error() {
            tracing::error!(
                error_id = %body.trace_id,
                error_code = %body.code,
                status_code = %status.as_u16(),
                message = %body.message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %body.trace_id,
                error_code = %body.code,
                status_code = %status.as_u16(),
                "Request error"
            );
        }

        (status, Json(ErrorEnvelope { error: body })).into_response()
    }
}

/// Bodies that parse but do not fit the target type are validation failures;
/// anything else the extractor refuses is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let message = e.body_text();
                AppError::validation(vec![serde_json::json!({ "error": message })], message)
            }
            other => AppError::bad_request(other.body_text()),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}
