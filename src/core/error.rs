use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::schema::{SchemaError, Violation};
use crate::shared::types::ApiResponse;

/// Application error taxonomy. Variants are transport-agnostic; the mapping
/// to HTTP status codes happens only in [`IntoResponse`] below.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Form template {0} not found or inactive")]
    TemplateNotFound(Uuid),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::InvalidTemplate(message) => AppError::InvalidTemplate(message),
            other => AppError::InvalidTemplate(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::TemplateNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Form template {} not found or inactive", id),
                None,
            ),
            AppError::InvalidTemplate(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::ValidationFailed(ref violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(violations.iter().map(ToString::to_string).collect()),
            ),
            AppError::Storage(ref msg) => {
                // Internal detail stays in the log; clients get a retryable
                // status without paths or credentials.
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "File storage is temporarily unavailable".to_string(),
                    None,
                )
            }
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_carries_every_violation() {
        let err = AppError::ValidationFailed(vec![
            Violation::new("email", "is required"),
            Violation::new("age", "must be at least 0"),
        ]);
        assert_eq!(err.to_string(), "Validation failed with 2 error(s)");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn schema_errors_convert_to_invalid_template() {
        let err: AppError = SchemaError::UnsupportedFieldType {
            field: "color".to_string(),
            ty: "rainbow".to_string(),
        }
        .into();
        match err {
            AppError::InvalidTemplate(message) => {
                assert!(message.contains("color"));
                assert!(message.contains("rainbow"));
            }
            other => panic!("expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn storage_failures_map_to_service_unavailable() {
        let response = AppError::Storage("s3 timed out".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
