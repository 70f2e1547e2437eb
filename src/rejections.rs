use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::RecordError;

/// Request-level failures. Every variant renders as `{"error": "..."}` JSON
/// with the matching status code.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    BadRequest(&'static str),
    Unauthorized,
    Forbidden,
    NotFound(&'static str),
    Conflict(&'static str),
    Unavailable(&'static str),
    Internal(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "authentication required"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "access denied"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match &err {
            RecordError::InvalidScore(_) => {
                AppError::BadRequest("score must be between 0 and 100")
            }
            RecordError::PassageNotFound(_) => AppError::NotFound("passage not found"),
            RecordError::PassageInactive(_) => {
                AppError::BadRequest("passage is no longer active")
            }
            RecordError::Conflict { .. } => {
                tracing::warn!("attempt submission conflicted: {err}");
                AppError::Unavailable("attempt could not be recorded, please retry")
            }
            RecordError::Storage(e) => {
                tracing::error!("storage failure while recording attempt: {e:?}");
                AppError::Unavailable("storage unavailable")
            }
        }
    }
}

pub trait ResultExt<T> {
    /// Log the underlying error and turn it into a 500 carrying `msg`.
    fn reject(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for color_eyre::Result<T> {
    fn reject(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{msg}: {e:?}");
            AppError::Internal(msg)
        })
    }
}
