use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taskhub_core::error::CoreError;
use taskhub_db::DbError;
use validator::ValidationErrors;

use crate::response::now_iso;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`DbError`] and adds HTTP-specific variants.
/// Every variant renders as the `{success: false, message, errors?, timestamp}`
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `taskhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Request DTO validation failures, reported per field.
    #[error("Validation failed: {0}")]
    Fields(#[from] ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// One failed field constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    timestamp: String,
}

/// Generic message for anything that must not leak internals.
const SERVER_ERROR: &str = "Server Error";

impl AppError {
    fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::Unauthorized(msg.into()))
    }

    /// 401 with a fixed, non-revealing message.
    pub fn not_authorized() -> Self {
        Self::unauthorized("Not authorized to access this route")
    }

    pub fn invalid_credentials() -> Self {
        Self::unauthorized("Invalid credentials")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, core.to_string(), None),
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
                CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR.to_string(), None)
                }
            },

            // --- Storage errors ---
            AppError::Database(err @ DbError::Duplicate { .. }) => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR.to_string(), None)
            }

            // --- HTTP-specific errors ---
            AppError::Fields(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(field_errors(errors)),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR.to_string(), None)
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
            timestamp: now_iso(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Flatten validator output into `(field, message)` pairs ordered by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'")),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
