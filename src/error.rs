//! HTTP-facing errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::FieldErrors;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    /// Course payload failed validation, keyed by field.
    #[error("Invalid course payload")]
    Validation(FieldErrors),

    /// Chat request body failed validation.
    #[error("Validation error: {}", .0.join("; "))]
    ChatValidation(Vec<String>),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Chat service unavailable")]
    Unavailable,
}

impl ApiError {
    /// Body-level problem not tied to a single field.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert("non_field_errors".to_string(), vec![message.into()]);
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
            ApiError::ChatValidation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation error", "details": details }),
            ),
            ApiError::Unexpected(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Unexpected error", "details": details }),
            ),
            ApiError::Store(err) => {
                tracing::error!("Course store failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Unexpected error", "details": err.to_string() }),
                )
            }
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Chat service at capacity" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
