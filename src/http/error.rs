//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ScheduleError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    Schedule(ScheduleError),
    /// Background task failed to join
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Schedule(err) => {
                let message = err.to_string();
                match err {
                    ScheduleError::Validation(errors) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        ApiError::new("VALIDATION_ERROR", message)
                            .with_details(serde_json::json!(errors)),
                    ),
                    ScheduleError::NotFound { .. } => {
                        (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
                    }
                    ScheduleError::RunInProgress => {
                        (StatusCode::CONFLICT, ApiError::new("RUN_IN_PROGRESS", message))
                    }
                    ScheduleError::Conflict(conflict) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("AVAILABILITY_CONFLICT", message)
                            .with_details(serde_json::json!(conflict.resource)),
                    ),
                    ScheduleError::ConstraintViolation { faculty_id, .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("WORKLOAD_LIMIT_EXCEEDED", message)
                            .with_details(serde_json::json!({ "facultyId": faculty_id })),
                    ),
                    ScheduleError::Config(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("CONFIG_ERROR", message),
                    ),
                }
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };
        if status.is_server_error() {
            error!(code = %body.code, message = %body.message, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Schedule(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("task join error: {err}"))
    }
}
